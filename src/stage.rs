//! Ticket stage tracking.
//!
//! Stage-dependent ticket actions are addressed by two ids that are not
//! stored on the ticket itself: the workflow task id and the workflow packet
//! task id of the current stage. Both are derived from a freshly fetched
//! ticket by scanning its task list for the open entry whose task name
//! equals the ticket's `status`.

use crate::models::{Ticket, WorkflowPacketTask};

/// Ids of the current stage of one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageIds {
    /// Id of the stage definition (`workflowTask.id`).
    pub workflow_task_id: String,
    /// Id of the stage instance on the ticket (`workflowPacketTasks[].id`).
    pub workflow_packet_task_id: String,
}

/// Holds the stage ids derived from the most recent ticket fetch.
///
/// A fetch that finds no matching entry leaves the previous ids in place.
/// Callers that act on a specific ticket should use the `StageIds` returned
/// by [`StageTracker::update_from`] rather than the retained values.
#[derive(Debug, Clone, Default)]
pub struct StageTracker {
    workflow_task_id: Option<String>,
    workflow_packet_task_id: Option<String>,
}

impl StageTracker {
    /// Creates a tracker with no ids.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the stage ids from a ticket and stores them.
    ///
    /// Returns the ids when an open entry for the current stage exists, or
    /// `None` when nothing matched, in which case the stored ids are unchanged.
    pub fn update_from(&mut self, ticket: &Ticket) -> Option<StageIds> {
        let task = current_stage_task(ticket)?;

        let ids = StageIds {
            workflow_task_id: task.workflow_task.id.clone(),
            workflow_packet_task_id: task.id.clone(),
        };
        self.workflow_task_id = Some(ids.workflow_task_id.clone());
        self.workflow_packet_task_id = Some(ids.workflow_packet_task_id.clone());

        Some(ids)
    }

    /// Workflow task id from the last successful derivation.
    pub fn workflow_task_id(&self) -> Option<&str> {
        self.workflow_task_id.as_deref()
    }

    /// Workflow packet task id from the last successful derivation.
    pub fn workflow_packet_task_id(&self) -> Option<&str> {
        self.workflow_packet_task_id.as_deref()
    }
}

/// Returns the open task entry for the ticket's current stage.
///
/// Entries are scanned in server order. When several open entries match,
/// the last one wins.
pub fn current_stage_task(ticket: &Ticket) -> Option<&WorkflowPacketTask> {
    let mut matches = ticket
        .workflow_packet_tasks
        .iter()
        .filter(|task| task.workflow_task.name == ticket.status && task.is_open());

    let mut current = matches.next()?;
    let mut extra = 0usize;
    for task in matches {
        current = task;
        extra += 1;
    }

    if extra > 0 {
        tracing::warn!(
            ticket_id = %ticket.display_id(),
            status = %ticket.status,
            matches = extra + 1,
            "Several open tasks match the current stage, using the last one"
        );
    }

    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket(value: serde_json::Value) -> Ticket {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_selects_open_entry_over_completed_one() {
        let ticket = ticket(json!({
            "id": 1,
            "status": "Review",
            "workflowPacketTasks": [
                {"id": 10, "workflowTask": {"id": 3, "name": "Review"}, "completed": "2024-01-01"},
                {"id": 11, "workflowTask": {"id": 4, "name": "Review"}},
                {"id": 12, "workflowTask": {"id": 5, "name": "Implement"}}
            ]
        }));

        let mut tracker = StageTracker::new();
        let ids = tracker.update_from(&ticket).unwrap();
        assert_eq!(ids.workflow_task_id, "4");
        assert_eq!(ids.workflow_packet_task_id, "11");
        assert_eq!(tracker.workflow_task_id(), Some("4"));
        assert_eq!(tracker.workflow_packet_task_id(), Some("11"));
    }

    #[test]
    fn test_completed_entry_listed_last_is_skipped() {
        let ticket = ticket(json!({
            "status": "Review",
            "workflowPacketTasks": [
                {"id": 11, "workflowTask": {"id": 4, "name": "Review"}},
                {"id": 10, "workflowTask": {"id": 3, "name": "Review"}, "completed": true}
            ]
        }));

        let ids = StageTracker::new().update_from(&ticket).unwrap();
        assert_eq!(ids.workflow_packet_task_id, "11");
    }

    #[test]
    fn test_no_match_on_first_use_leaves_ids_empty() {
        let ticket = ticket(json!({
            "status": "Approve",
            "workflowPacketTasks": [
                {"id": 10, "workflowTask": {"id": 3, "name": "Review"}}
            ]
        }));

        let mut tracker = StageTracker::new();
        assert!(tracker.update_from(&ticket).is_none());
        assert!(tracker.workflow_task_id().is_none());
        assert!(tracker.workflow_packet_task_id().is_none());
    }

    #[test]
    fn test_no_match_keeps_previous_ids() {
        let first = ticket(json!({
            "status": "Review",
            "workflowPacketTasks": [{"id": 11, "workflowTask": {"id": 4, "name": "Review"}}]
        }));
        let second = ticket(json!({
            "status": "Approve",
            "workflowPacketTasks": [
                {"id": 21, "workflowTask": {"id": 6, "name": "Approve"}, "completed": "yes"}
            ]
        }));

        let mut tracker = StageTracker::new();
        tracker.update_from(&first).unwrap();
        assert!(tracker.update_from(&second).is_none());
        assert_eq!(tracker.workflow_task_id(), Some("4"));
        assert_eq!(tracker.workflow_packet_task_id(), Some("11"));
    }

    #[test]
    fn test_multiple_open_matches_last_wins() {
        let ticket = ticket(json!({
            "status": "Review",
            "workflowPacketTasks": [
                {"id": 11, "workflowTask": {"id": 4, "name": "Review"}},
                {"id": 12, "workflowTask": {"id": 5, "name": "Review"}}
            ]
        }));

        let task = current_stage_task(&ticket).unwrap();
        assert_eq!(task.id, "12");
        assert_eq!(task.workflow_task.id, "5");
    }

    #[test]
    fn test_stage_name_match_is_exact() {
        let ticket = ticket(json!({
            "status": "Review",
            "workflowPacketTasks": [{"id": 11, "workflowTask": {"id": 4, "name": "review"}}]
        }));
        assert!(current_stage_task(&ticket).is_none());
    }
}
