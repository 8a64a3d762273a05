//! Policy Planner client.
//!
//! Policy Planner tickets carry rule-change requirements through a
//! workflow. Actions that operate on the ticket's current stage (assign,
//! requirements, changes, task completion) re-fetch the ticket first and
//! build their URL from the freshly derived stage ids. These methods take
//! `&mut self`.
//!
//! # Example
//!
//! ```ignore
//! let config = Config::from_env()?;
//! let mut planner = PolicyPlannerClient::from_config(&config).await?;
//!
//! let ticket = planner.create_ticket(json!({"variables": {"summary": "Open 443"}})).await?;
//! planner.assign("42", "7").await?;
//! planner.complete_task("42", TaskAction::Submit, None).await?;
//! planner.logout().await?;
//! ```

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use crate::bulk::BulkReport;
use crate::config::Config;
use crate::endpoints::{validate_id, Endpoint};
use crate::error::ApiError;
use crate::models::{
    describe_staged_attachment, ControlType, IdListing, ParsedRequirements, RequirementBehavior,
    RequirementSet, TaskAction, Ticket,
};
use crate::session::{ApiRequest, ApiResponse, Session};
use crate::tickets::{DeskRoutes, TicketDesk};
use crate::workflow::WorkflowResolver;

/// Description given to the CSV file re-attached after a requirement upload.
pub const CSV_ATTACHMENT_DESCRIPTION: &str = "Attached original CSV file";

const ROUTES: DeskRoutes = DeskRoutes {
    workflows: Endpoint::PlannerWorkflows,
    ticket: Endpoint::PlannerTicket,
};

/// Returns true if the ticket has an assignee.
pub fn is_assigned(ticket: &Ticket) -> bool {
    ticket.is_assigned()
}

/// Client for Policy Planner tickets in one workflow.
pub struct PolicyPlannerClient {
    desk: TicketDesk,
}

impl PolicyPlannerClient {
    /// Creates a client and resolves the workflow by name.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::WorkflowNotFound` if the domain has no workflow
    /// with this name.
    pub async fn connect(
        session: Session,
        domain_id: impl Into<String>,
        workflow_name: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let desk = TicketDesk::connect(session, domain_id, workflow_name, ROUTES).await?;
        Ok(Self { desk })
    }

    /// Logs in and connects using the configured domain and workflow.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if no workflow is configured.
    pub async fn from_config(config: &Config) -> Result<Self, ApiError> {
        let workflow = config
            .workflow
            .clone()
            .ok_or_else(|| ApiError::missing_env("SECMGR_WORKFLOW"))?;
        let session = Session::login(config).await?;
        Self::connect(session, config.domain_id.clone(), workflow).await
    }

    /// Creates a client for a workflow whose id is already known.
    pub fn with_workflow_id(
        session: Session,
        domain_id: impl Into<String>,
        workflow_name: impl Into<String>,
        workflow_id: impl Into<String>,
    ) -> Self {
        let resolver = WorkflowResolver::with_id(ROUTES.workflows, workflow_name, workflow_id);
        Self {
            desk: TicketDesk::with_resolver(session, domain_id, resolver, ROUTES),
        }
    }

    /// Returns the underlying ticket desk.
    pub fn desk(&self) -> &TicketDesk {
        &self.desk
    }

    /// Returns the resolved workflow id.
    pub async fn workflow_id(&self) -> Result<String, ApiError> {
        self.desk.workflow_id().await
    }

    /// Builds a URL whose arguments are the domain, the workflow and `rest`.
    async fn workflow_url(
        &self,
        endpoint: Endpoint,
        rest: &[&dyn std::fmt::Display],
    ) -> Result<String, ApiError> {
        let workflow_id = self.desk.workflow_id().await?;
        let domain_id = self.desk.domain_id();
        let mut args: Vec<&dyn std::fmt::Display> = Vec::with_capacity(rest.len() + 2);
        args.push(&domain_id);
        args.push(&workflow_id);
        args.extend_from_slice(rest);
        self.desk.session().url(endpoint, &args)
    }

    // ========================================================================
    // Tickets
    // ========================================================================

    /// Creates a ticket and returns the server's JSON for it.
    pub async fn create_ticket(&self, body: Value) -> Result<Value, ApiError> {
        let url = self.workflow_url(Endpoint::PlannerTicketCreate, &[]).await?;
        let ticket: Value = self
            .desk
            .execute(ApiRequest::post(url).json(body))
            .await?
            .decode("created ticket")?;

        tracing::info!(
            ticket_id = %ticket.get("id").map(|id| id.to_string()).unwrap_or_default(),
            workflow = %self.desk.workflow_name(),
            "Created Policy Planner ticket"
        );
        Ok(ticket)
    }

    /// Replaces the ticket's editable fields.
    pub async fn update_ticket(&self, ticket_id: &str, body: Value) -> Result<ApiResponse, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerTicket, &[&ticket_id])
            .await?;
        self.desk.execute(ApiRequest::put(url).json(body)).await
    }

    /// Fetches a ticket and records its current stage ids.
    pub async fn pull_ticket(&mut self, ticket_id: &str) -> Result<Ticket, ApiError> {
        self.desk.pull_ticket(ticket_id).await
    }

    /// Runs a SIQL ticket search in this domain.
    pub async fn search_tickets(&self, query: &str, page_size: u32) -> Result<Value, ApiError> {
        let domain_id = self.desk.domain_id();
        let url = self
            .desk
            .session()
            .url(Endpoint::PlannerTicketSearch, &[&domain_id])?;
        let request = ApiRequest::get(url)
            .query("q", query)
            .query("pageSize", page_size)
            .query("domainid", domain_id);
        self.desk.execute(request).await?.decode("ticket search results")
    }

    /// Lists a ticket's attachments.
    pub async fn list_attachments(&self, ticket_id: &str, page_size: u32) -> Result<Value, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerAttachments, &[&ticket_id])
            .await?;
        self.desk
            .execute(ApiRequest::get(url).query("pageSize", page_size))
            .await?
            .decode("attachment listing")
    }

    /// Downloads one attachment and returns its raw bytes.
    pub async fn download_attachment(
        &self,
        ticket_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerAttachment, &[&ticket_id, &attachment_id])
            .await?;
        Ok(self.desk.execute(ApiRequest::get(url)).await?.into_bytes())
    }

    /// Lists a ticket's history events.
    pub async fn list_events(&self, ticket_id: &str, page_size: u32) -> Result<Value, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerEvents, &[&ticket_id])
            .await?;
        self.desk
            .execute(ApiRequest::get(url).query("pageSize", page_size))
            .await?
            .decode("ticket events")
    }

    // ========================================================================
    // Stage-dependent actions
    // ========================================================================

    /// Assigns the ticket's current stage to a user.
    ///
    /// The user id is sent as a `text/plain` body.
    pub async fn assign(&mut self, ticket_id: &str, user_id: &str) -> Result<ApiResponse, ApiError> {
        validate_id(user_id, "user_id")?;
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let url = self
            .workflow_url(
                Endpoint::PlannerAssign,
                &[&ids.workflow_task_id, &ticket_id, &ids.workflow_packet_task_id],
            )
            .await?;

        let response = self.desk.execute(ApiRequest::put(url).text(user_id)).await?;
        tracing::info!(ticket_id = %ticket_id, user_id = %user_id, "Assigned ticket");
        Ok(response)
    }

    /// Removes the assignee from the ticket's current stage.
    pub async fn unassign(&mut self, ticket_id: &str) -> Result<ApiResponse, ApiError> {
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let url = self
            .workflow_url(
                Endpoint::PlannerUnassign,
                &[&ids.workflow_task_id, &ticket_id, &ids.workflow_packet_task_id],
            )
            .await?;
        self.desk.execute(ApiRequest::put(url)).await
    }

    /// Adds requirements to the ticket.
    pub async fn add_requirements(
        &mut self,
        ticket_id: &str,
        requirements: Value,
    ) -> Result<ApiResponse, ApiError> {
        self.submit_requirements(ticket_id, requirements, RequirementBehavior::Append)
            .await
    }

    /// Replaces all of the ticket's requirements.
    pub async fn replace_requirements(
        &mut self,
        ticket_id: &str,
        requirements: Value,
    ) -> Result<ApiResponse, ApiError> {
        self.submit_requirements(ticket_id, requirements, RequirementBehavior::Replace)
            .await
    }

    async fn submit_requirements(
        &mut self,
        ticket_id: &str,
        requirements: Value,
        behavior: RequirementBehavior,
    ) -> Result<ApiResponse, ApiError> {
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let endpoint = match behavior {
            RequirementBehavior::Append => Endpoint::PlannerRequirements,
            RequirementBehavior::Replace => Endpoint::PlannerRequirementsReplace,
        };
        let url = self
            .workflow_url(endpoint, &[&ids.workflow_task_id, &ticket_id])
            .await?;
        self.desk
            .execute(ApiRequest::post(url).json(requirements))
            .await
    }

    /// Completes the ticket's current stage with a button action.
    ///
    /// # Arguments
    ///
    /// * `ticket_id` - Ticket to act on
    /// * `action` - One of `Submit`, `Complete`, `AutoDesign`, `Verify`, `Approved`
    /// * `timeout` - Optional limit for this request; none by default
    pub async fn complete_task(
        &mut self,
        ticket_id: &str,
        action: TaskAction,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, ApiError> {
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let url = self
            .workflow_url(
                Endpoint::PlannerTaskAction,
                &[
                    &ids.workflow_task_id,
                    &ticket_id,
                    &ids.workflow_packet_task_id,
                    &action,
                ],
            )
            .await?;

        let response = self
            .desk
            .execute(ApiRequest::put(url).json(json!({})).timeout(timeout))
            .await?;
        tracing::info!(ticket_id = %ticket_id, action = %action, "Completed ticket task");
        Ok(response)
    }

    /// Returns the ticket's requirements.
    pub async fn get_requirements(&mut self, ticket_id: &str) -> Result<Value, ApiError> {
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let url = self
            .workflow_url(Endpoint::PlannerRequirements, &[&ids.workflow_task_id, &ticket_id])
            .await?;
        self.desk.execute(ApiRequest::get(url)).await?.decode("requirements")
    }

    /// Returns the changes designed for the ticket.
    pub async fn get_changes(&mut self, ticket_id: &str) -> Result<Value, ApiError> {
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let url = self
            .workflow_url(Endpoint::PlannerChanges, &[&ids.workflow_task_id, &ticket_id])
            .await?;
        self.desk.execute(ApiRequest::get(url)).await?.decode("changes")
    }

    /// Deletes every requirement on the ticket.
    ///
    /// The ticket is fetched once; then one DELETE is issued per listed
    /// requirement. A failed delete is recorded and the remaining ones are
    /// still attempted. Errors before the first delete (fetch, listing) are
    /// returned directly.
    pub async fn delete_all_requirements(&mut self, ticket_id: &str) -> Result<BulkReport, ApiError> {
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let list_url = self
            .workflow_url(Endpoint::PlannerRequirements, &[&ids.workflow_task_id, &ticket_id])
            .await?;
        let listing: IdListing = self
            .desk
            .execute(ApiRequest::get(list_url))
            .await?
            .decode("requirements")?;

        let mut report = BulkReport::new();
        for requirement in listing.results {
            let url = self
                .workflow_url(
                    Endpoint::PlannerRequirement,
                    &[&ids.workflow_task_id, &ticket_id, &requirement.id],
                )
                .await?;
            let result = self
                .desk
                .execute(ApiRequest::delete(url))
                .await
                .map(|response| response.status());

            if let Err(e) = &result {
                tracing::warn!(
                    ticket_id = %ticket_id,
                    requirement_id = %requirement.id,
                    error = %e,
                    "Failed to delete requirement"
                );
            }
            report.record(requirement.id, result);
        }

        tracing::info!(ticket_id = %ticket_id, summary = %report.summary(), "Deleted requirements");
        Ok(report)
    }

    /// Approves one requirement.
    pub async fn approve_requirement(
        &self,
        ticket_id: &str,
        requirement_id: &str,
    ) -> Result<ApiResponse, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        validate_id(requirement_id, "requirement_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerRequirementApprove, &[&ticket_id, &requirement_id])
            .await?;
        self.desk.execute(ApiRequest::put(url).json(json!({}))).await
    }

    /// Adds a change to a requirement.
    pub async fn add_change(
        &mut self,
        ticket_id: &str,
        requirement_id: &str,
        change: Value,
    ) -> Result<ApiResponse, ApiError> {
        validate_id(requirement_id, "requirement_id")?;
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let url = self
            .workflow_url(
                Endpoint::PlannerChangeAdd,
                &[&ids.workflow_task_id, &ticket_id, &requirement_id],
            )
            .await?;
        self.desk.execute(ApiRequest::post(url).json(change)).await
    }

    /// Updates an existing change on a requirement.
    pub async fn update_change(
        &mut self,
        ticket_id: &str,
        requirement_id: &str,
        change_id: &str,
        change: Value,
    ) -> Result<ApiResponse, ApiError> {
        validate_id(requirement_id, "requirement_id")?;
        validate_id(change_id, "change_id")?;
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let url = self
            .workflow_url(
                Endpoint::PlannerChange,
                &[&ids.workflow_task_id, &ticket_id, &requirement_id, &change_id],
            )
            .await?;
        self.desk.execute(ApiRequest::put(url).json(change)).await
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Adds a comment to the ticket.
    pub async fn add_comment(&self, ticket_id: &str, comment: &str) -> Result<ApiResponse, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerComment, &[&ticket_id])
            .await?;
        self.desk
            .execute(ApiRequest::post(url).json(json!({ "comment": comment })))
            .await
    }

    /// Lists the ticket's comments.
    pub async fn list_comments(&self, ticket_id: &str) -> Result<Value, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerComments, &[&ticket_id])
            .await?;
        self.desk.execute(ApiRequest::get(url)).await?.decode("comments")
    }

    /// Deletes one comment.
    pub async fn delete_comment(
        &self,
        ticket_id: &str,
        comment_id: &str,
    ) -> Result<ApiResponse, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        validate_id(comment_id, "comment_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerCommentDelete, &[&ticket_id, &comment_id])
            .await?;
        self.desk.execute(ApiRequest::delete(url)).await
    }

    // ========================================================================
    // Attachments
    // ========================================================================

    /// Uploads a file to the workflow's staging area.
    ///
    /// Returns the staging response, which carries an `attachments` array.
    pub async fn stage_attachment(&self, file_name: &str, contents: Vec<u8>) -> Result<Value, ApiError> {
        let url = self
            .workflow_url(Endpoint::PlannerAttachmentStage, &[])
            .await?;
        self.desk
            .execute(ApiRequest::post(url).multipart(file_form(file_name, contents)))
            .await?
            .decode("staged attachment")
    }

    /// Attaches a staged file to the ticket.
    pub async fn post_attachment(&self, ticket_id: &str, staged: Value) -> Result<Value, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerAttachmentPost, &[&ticket_id])
            .await?;
        self.desk
            .execute(ApiRequest::put(url).json(staged))
            .await?
            .decode("posted attachment")
    }

    /// Stages a file, describes it and attaches it to the ticket.
    pub async fn add_attachment(
        &self,
        ticket_id: &str,
        file_name: &str,
        contents: Vec<u8>,
        description: &str,
    ) -> Result<Value, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let mut staged = self.stage_attachment(file_name, contents).await?;
        describe_staged_attachment(&mut staged, description)?;
        self.post_attachment(ticket_id, staged).await
    }

    /// Uploads requirements from a CSV file.
    ///
    /// The server parses the file, the parsed requirements are added to (or
    /// replace) the ticket's requirements, and the original file is attached
    /// to the ticket. Steps are not rolled back if a later one fails.
    ///
    /// Returns the response of the add or replace call.
    pub async fn upload_requirements_csv(
        &mut self,
        ticket_id: &str,
        file_name: &str,
        contents: Vec<u8>,
        behavior: RequirementBehavior,
    ) -> Result<ApiResponse, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self
            .workflow_url(Endpoint::PlannerRequirementsParse, &[])
            .await?;
        let parsed: ParsedRequirements = self
            .desk
            .execute(ApiRequest::post(url).multipart(file_form(file_name, contents.clone())))
            .await?
            .decode("parsed requirements")?;

        let requirements: RequirementSet = parsed.into_requirements();
        tracing::debug!(
            ticket_id = %ticket_id,
            count = requirements.requirements.len(),
            "Parsed requirement CSV"
        );

        let response = self
            .submit_requirements(ticket_id, requirements.to_json()?, behavior)
            .await?;

        self.add_attachment(ticket_id, file_name, contents, CSV_ATTACHMENT_DESCRIPTION)
            .await?;

        Ok(response)
    }

    // ========================================================================
    // Pre-change assessment
    // ========================================================================

    /// Starts a pre-change assessment of the ticket's changes.
    pub async fn start_pca(
        &self,
        ticket_id: &str,
        controls: &[ControlType],
        enable_risk_sa: bool,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self.workflow_url(Endpoint::PlannerPca, &[&ticket_id]).await?;
        let request = ApiRequest::post(url)
            .query_pairs(controls.iter().map(|c| ("controlTypes", c.as_str())))
            .query("enableRiskSa", enable_risk_sa)
            .timeout(timeout);
        self.desk.execute(request).await
    }

    /// Returns the latest pre-change assessment results.
    pub async fn retrieve_pca(&self, ticket_id: &str) -> Result<Value, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let url = self.workflow_url(Endpoint::PlannerPca, &[&ticket_id]).await?;
        self.desk.execute(ApiRequest::get(url)).await?.decode("PCA results")
    }

    /// Starts an assessment and immediately retrieves the results.
    ///
    /// There is no polling; if the assessment has not finished the results
    /// are whatever the server returns at that moment.
    pub async fn run_pca(
        &self,
        ticket_id: &str,
        controls: &[ControlType],
        enable_risk_sa: bool,
    ) -> Result<Value, ApiError> {
        self.start_pca(ticket_id, controls, enable_risk_sa, None).await?;
        self.retrieve_pca(ticket_id).await
    }

    /// Ends the session.
    pub async fn logout(self) -> Result<ApiResponse, ApiError> {
        self.desk.into_session().logout().await
    }
}

/// Single-file multipart form, with the file name as the field name.
fn file_form(file_name: &str, contents: Vec<u8>) -> Form {
    let part = Part::bytes(contents).file_name(file_name.to_string());
    Form::new().part(file_name.to_string(), part)
}
