//! REST endpoint templates.
//!
//! Every endpoint is a fixed path template with positional `{}` placeholders.
//! Arguments are substituted in order, so the argument order documented on
//! each variant must be preserved exactly. The host is prepended verbatim;
//! each argument is percent-encoded as a single path segment.

use std::fmt::Display;

use crate::error::ApiError;

/// A server endpoint, identified by its path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Session login. No arguments.
    Login,
    /// Session logout. No arguments.
    Logout,

    /// Policy Planner workflow listing. Args: domain.
    PlannerWorkflows,
    /// Create a Policy Planner ticket. Args: domain, workflow.
    PlannerTicketCreate,
    /// A Policy Planner ticket. Args: domain, workflow, ticket.
    PlannerTicket,
    /// SIQL ticket search. Args: domain.
    PlannerTicketSearch,
    /// Ticket attachment listing. Args: domain, workflow, ticket.
    PlannerAttachments,
    /// A single attachment. Args: domain, workflow, ticket, attachment.
    PlannerAttachment,
    /// Stage a file before attaching it. Args: domain, workflow.
    PlannerAttachmentStage,
    /// Attach a staged file to a ticket. Args: domain, workflow, ticket.
    PlannerAttachmentPost,
    /// Ticket history events. Args: domain, workflow, ticket.
    PlannerEvents,
    /// Assign the current stage. Args: domain, workflow, task, ticket, packet task.
    PlannerAssign,
    /// Unassign the current stage. Args: domain, workflow, task, ticket, packet task.
    PlannerUnassign,
    /// Complete the current stage with a button action.
    /// Args: domain, workflow, task, ticket, packet task, action.
    PlannerTaskAction,
    /// Requirements of the current stage. Args: domain, workflow, task, ticket.
    PlannerRequirements,
    /// Replace all requirements. Args: domain, workflow, task, ticket.
    PlannerRequirementsReplace,
    /// A single requirement. Args: domain, workflow, task, ticket, requirement.
    PlannerRequirement,
    /// Approve a requirement. Args: domain, workflow, ticket, requirement.
    PlannerRequirementApprove,
    /// Server-side CSV requirement parsing. Args: domain, workflow.
    PlannerRequirementsParse,
    /// Changes of the current stage. Args: domain, workflow, task, ticket.
    PlannerChanges,
    /// Add a change to a requirement. Args: domain, workflow, task, ticket, requirement.
    PlannerChangeAdd,
    /// A single change. Args: domain, workflow, task, ticket, requirement, change.
    PlannerChange,
    /// Pre-change assessment. Args: domain, workflow, ticket.
    PlannerPca,
    /// Add a comment. Args: domain, workflow, ticket.
    PlannerComment,
    /// List comments. Args: domain, workflow, ticket.
    PlannerComments,
    /// Delete a comment. Args: domain, workflow, ticket, comment.
    PlannerCommentDelete,

    /// Policy Optimizer workflow listing. Args: domain.
    OptimizerWorkflows,
    /// Create a Policy Optimizer ticket. Args: domain.
    OptimizerTicketCreate,
    /// A Policy Optimizer ticket. Args: domain, workflow, ticket.
    OptimizerTicket,
    /// Assign the current stage. Args: domain, workflow, task, ticket, packet task.
    OptimizerAssign,
    /// Complete or cancel the current stage.
    /// Args: domain, workflow, task, ticket, packet task, mode.
    OptimizerTaskAction,
    /// SIQL ticket search. Args: domain.
    OptimizerTicketSearch,

    /// Device listing. Args: domain.
    Devices,
    /// A single device. Args: domain, device.
    Device,
    /// Trigger a manual retrieval. Args: domain, device.
    DeviceRetrieval,
    /// SIQL search. Args: query target.
    Siql,
    /// Device groups. Args: domain.
    DeviceGroups,
    /// Device group membership. Args: domain, group, device.
    DeviceGroupMember,
    /// Device group lookup by name. Args: domain, name.
    DeviceGroupByName,
    /// Zones of a device. Args: domain, device.
    Zones,
    /// Firewall object by match id. Args: object type, device, match id.
    FirewallObject,
    /// Supplemental routes of a device. Args: device.
    SupplementalRoute,
    /// Rule documentation. Args: domain, device, rule.
    RuleDoc,
    /// Rule documentation update. Args: domain, device.
    RuleDocUpdate,
    /// Users. Args: domain.
    Users,
    /// User groups. Args: domain.
    UserGroups,
    /// Users of a group. Args: domain, group.
    UserGroupMembers,
    /// Group membership of one user. Args: domain, group, user.
    UserGroupMember,

    /// Orchestration rule recommendation. Args: domain.
    RuleRecommendation,
    /// Orchestration device pre-change assessment. Args: domain, device.
    DevicePca,
}

impl Endpoint {
    /// Returns the path template, without the host.
    pub const fn template(self) -> &'static str {
        use Endpoint::*;
        match self {
            Login => "/securitymanager/api/authentication/login",
            Logout => "/securitymanager/api/authentication/logout",

            PlannerWorkflows => "/policyplanner/api/domain/{}/workflow/version/latest/all",
            PlannerTicketCreate => "/policyplanner/api/domain/{}/workflow/{}/packet",
            PlannerTicket => "/policyplanner/api/domain/{}/workflow/{}/packet/{}",
            PlannerTicketSearch => "/policyplanner/api/domain/{}/siql/ticket/paged-search",
            PlannerAttachments => "/policyplanner/api/domain/{}/workflow/{}/packet/{}/attachments",
            PlannerAttachment => "/policyplanner/api/domain/{}/workflow/{}/packet/{}/attachment/{}",
            PlannerAttachmentStage => "/policyplanner/api/domain/{}/workflow/{}/attachment/stage",
            PlannerAttachmentPost => "/policyplanner/api/domain/{}/workflow/{}/packet/{}/attachment",
            PlannerEvents => "/policyplanner/api/domain/{}/workflow/{}/packet/{}/events",
            PlannerAssign => {
                "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/packettask/{}/assign"
            }
            PlannerUnassign => {
                "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/packettask/{}/unassign"
            }
            PlannerTaskAction => {
                "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/packettask/{}/{}"
            }
            PlannerRequirements => {
                "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/requirements"
            }
            PlannerRequirementsReplace => {
                "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/requirements/replace"
            }
            PlannerRequirement => {
                "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/requirement/{}"
            }
            PlannerRequirementApprove => {
                "/policyplanner/api/domain/{}/workflow/{}/packet/{}/requirement/{}/approve"
            }
            PlannerRequirementsParse => {
                "/policyplanner/api/domain/{}/workflow/{}/requirements/csv/parse"
            }
            PlannerChanges => "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/changes",
            PlannerChangeAdd => {
                "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/requirement/{}/change"
            }
            PlannerChange => {
                "/policyplanner/api/domain/{}/workflow/{}/task/{}/packet/{}/requirement/{}/change/{}"
            }
            PlannerPca => "/policyplanner/api/domain/{}/workflow/{}/packet/{}/pca",
            PlannerComment => "/policyplanner/api/domain/{}/workflow/{}/packet/{}/comment",
            PlannerComments => "/policyplanner/api/domain/{}/workflow/{}/packet/{}/comments",
            PlannerCommentDelete => "/policyplanner/api/domain/{}/workflow/{}/packet/{}/comment/{}",

            OptimizerWorkflows => "/policyoptimizer/api/domain/{}/workflow/version/latest/all",
            OptimizerTicketCreate => "/policyoptimizer/api/domain/{}/ticket",
            OptimizerTicket => "/policyoptimizer/api/domain/{}/workflow/{}/packet/{}",
            OptimizerAssign => {
                "/policyoptimizer/api/domain/{}/workflow/{}/task/{}/packet/{}/packettask/{}/assign"
            }
            OptimizerTaskAction => {
                "/policyoptimizer/api/domain/{}/workflow/{}/task/{}/packet/{}/packettask/{}/{}"
            }
            OptimizerTicketSearch => "/policyoptimizer/api/domain/{}/siql/ticket/paged-search",

            Devices => "/securitymanager/api/domain/{}/device",
            Device => "/securitymanager/api/domain/{}/device/{}",
            DeviceRetrieval => "/securitymanager/api/domain/{}/device/{}/manualretrieval",
            Siql => "/securitymanager/api/siql/{}/paged-search",
            DeviceGroups => "/securitymanager/api/domain/{}/devicegroup",
            DeviceGroupMember => "/securitymanager/api/domain/{}/devicegroup/{}/device/{}",
            DeviceGroupByName => "/securitymanager/api/domain/{}/devicegroup/name/{}",
            Zones => "/securitymanager/api/domain/{}/device/{}/zone",
            FirewallObject => "/securitymanager/api/firewallobject/{}/device/{}/match/{}",
            SupplementalRoute => "/securitymanager/api/device/{}/supplementalroute",
            RuleDoc => "/securitymanager/api/domain/{}/device/{}/rule/{}/ruledoc",
            RuleDocUpdate => "/securitymanager/api/domain/{}/device/{}/ruledoc",
            Users => "/securitymanager/api/domain/{}/user",
            UserGroups => "/securitymanager/api/domain/{}/usergroup",
            UserGroupMembers => "/securitymanager/api/domain/{}/usergroup/{}/user",
            UserGroupMember => "/securitymanager/api/domain/{}/usergroup/{}/user/{}",

            RuleRecommendation => "/orchestration/api/domain/{}/change/rulerec",
            DevicePca => "/orchestration/api/domain/{}/change/device/{}/pca",
        }
    }

    /// Returns a short name for logs and errors.
    pub fn name(self) -> &'static str {
        use Endpoint::*;
        match self {
            Login => "login",
            Logout => "logout",
            PlannerWorkflows => "planner_workflows",
            PlannerTicketCreate => "planner_ticket_create",
            PlannerTicket => "planner_ticket",
            PlannerTicketSearch => "planner_ticket_search",
            PlannerAttachments => "planner_attachments",
            PlannerAttachment => "planner_attachment",
            PlannerAttachmentStage => "planner_attachment_stage",
            PlannerAttachmentPost => "planner_attachment_post",
            PlannerEvents => "planner_events",
            PlannerAssign => "planner_assign",
            PlannerUnassign => "planner_unassign",
            PlannerTaskAction => "planner_task_action",
            PlannerRequirements => "planner_requirements",
            PlannerRequirementsReplace => "planner_requirements_replace",
            PlannerRequirement => "planner_requirement",
            PlannerRequirementApprove => "planner_requirement_approve",
            PlannerRequirementsParse => "planner_requirements_parse",
            PlannerChanges => "planner_changes",
            PlannerChangeAdd => "planner_change_add",
            PlannerChange => "planner_change",
            PlannerPca => "planner_pca",
            PlannerComment => "planner_comment",
            PlannerComments => "planner_comments",
            PlannerCommentDelete => "planner_comment_delete",
            OptimizerWorkflows => "optimizer_workflows",
            OptimizerTicketCreate => "optimizer_ticket_create",
            OptimizerTicket => "optimizer_ticket",
            OptimizerAssign => "optimizer_assign",
            OptimizerTaskAction => "optimizer_task_action",
            OptimizerTicketSearch => "optimizer_ticket_search",
            Devices => "devices",
            Device => "device",
            DeviceRetrieval => "device_retrieval",
            Siql => "siql",
            DeviceGroups => "device_groups",
            DeviceGroupMember => "device_group_member",
            DeviceGroupByName => "device_group_by_name",
            Zones => "zones",
            FirewallObject => "firewall_object",
            SupplementalRoute => "supplemental_route",
            RuleDoc => "rule_doc",
            RuleDocUpdate => "rule_doc_update",
            Users => "users",
            UserGroups => "user_groups",
            UserGroupMembers => "user_group_members",
            UserGroupMember => "user_group_member",
            RuleRecommendation => "rule_recommendation",
            DevicePca => "device_pca",
        }
    }

    /// Number of positional arguments the template expects.
    pub fn arity(self) -> usize {
        self.template().matches("{}").count()
    }

    /// Builds the full URL for this endpoint.
    ///
    /// # Arguments
    ///
    /// * `host` - Normalized base URL, inserted verbatim
    /// * `args` - Positional arguments, in template order
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Template` if the argument count does not match the
    /// number of placeholders.
    pub fn url(self, host: &str, args: &[&dyn Display]) -> Result<String, ApiError> {
        let expected = self.arity();
        if args.len() != expected {
            return Err(ApiError::Template {
                endpoint: self.name(),
                expected,
                got: args.len(),
            });
        }

        let mut url = String::with_capacity(host.len() + self.template().len() + 16);
        url.push_str(host.trim_end_matches('/'));

        let mut pieces = self.template().split("{}");
        if let Some(first) = pieces.next() {
            url.push_str(first);
        }
        for (arg, piece) in args.iter().zip(pieces) {
            url.push_str(&urlencoding::encode(&arg.to_string()));
            url.push_str(piece);
        }

        Ok(url)
    }
}

/// Validates that an id is a numeric string, as the server expects.
///
/// # Errors
///
/// Returns `ApiError::Validation` if the id is empty or contains non-digit characters.
pub fn validate_id(id: &str, field_name: &str) -> Result<(), ApiError> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation(format!(
            "{} must be a numeric string, got: {:?}",
            field_name,
            id.chars().take(50).collect::<String>()
        )));
    }
    Ok(())
}
