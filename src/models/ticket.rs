//! Ticket and workflow models.
//!
//! A ticket moves through the stages (tasks) of its workflow. Its
//! `workflowPacketTasks` list holds one entry per stage instance; the open
//! entry for the current stage carries the ids needed to act on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::common::{optional_string_or_int, present, string_or_int};
use crate::error::ApiError;

/// A policy-change ticket.
///
/// Only the fields the client relies on are typed; everything else the
/// server sends is kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket id.
    #[serde(default, deserialize_with = "optional_string_or_int")]
    pub id: Option<String>,

    /// Name of the current stage.
    pub status: String,

    /// Stage instances in server order.
    pub workflow_packet_tasks: Vec<WorkflowPacketTask>,

    /// Current assignee. `Some` whenever the key was sent, even as `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee: Option<serde_json::Value>,

    /// All other ticket fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Ticket {
    /// Returns true if the ticket has an assignee.
    pub fn is_assigned(&self) -> bool {
        self.assignee.is_some()
    }

    /// Returns the id or a placeholder.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("(unsaved)")
    }
}

/// One stage instance of a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPacketTask {
    /// Packet task id.
    #[serde(deserialize_with = "string_or_int")]
    pub id: String,

    /// The stage definition this entry instantiates.
    pub workflow_task: WorkflowTask,

    /// Completion marker. `Some` whenever the key was sent, even as `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed: Option<serde_json::Value>,

    /// All other fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WorkflowPacketTask {
    /// Returns true if the entry carries no completion marker.
    pub fn is_open(&self) -> bool {
        self.completed.is_none()
    }
}

/// A named stage definition within a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTask {
    /// Workflow task id.
    #[serde(deserialize_with = "string_or_int")]
    pub id: String,

    /// Stage name, compared against the ticket status.
    pub name: String,
}

/// A workflow as returned by the workflow listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    /// Workflow id.
    #[serde(deserialize_with = "string_or_int")]
    pub id: String,

    /// Human name of the workflow.
    pub name: String,
}

/// One entry of the workflow listing.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowEntry {
    /// The workflow.
    pub workflow: Workflow,
}

/// A page of the workflow listing.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowPage {
    /// Total number of workflows in the domain.
    pub total: u64,

    /// Workflows on this page.
    pub results: Vec<WorkflowEntry>,
}

/// Trailing action mode of a stage completion.
///
/// Policy Planner tickets use the button actions; Policy Optimizer tickets
/// are completed with `Complete` or cancelled with `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Submit the ticket.
    Submit,
    /// Complete the stage.
    Complete,
    /// Run automatic design.
    AutoDesign,
    /// Verify the implemented changes.
    Verify,
    /// Approve the stage.
    Approved,
    /// Cancel the ticket.
    Cancelled,
}

impl TaskAction {
    /// Returns the wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskAction::Submit => "submit",
            TaskAction::Complete => "complete",
            TaskAction::AutoDesign => "autoDesign",
            TaskAction::Verify => "verify",
            TaskAction::Approved => "approved",
            TaskAction::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskAction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submit" => Ok(TaskAction::Submit),
            "complete" => Ok(TaskAction::Complete),
            "autoDesign" => Ok(TaskAction::AutoDesign),
            "verify" => Ok(TaskAction::Verify),
            "approved" => Ok(TaskAction::Approved),
            "cancelled" => Ok(TaskAction::Cancelled),
            other => Err(ApiError::validation(format!(
                "unknown task action {:?}",
                other
            ))),
        }
    }
}
