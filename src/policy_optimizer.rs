//! Policy Optimizer client.
//!
//! Optimizer tickets review existing rules. Completing and cancelling a
//! ticket use the same action endpoint and differ only in the trailing
//! mode.

use serde_json::{json, Value};

use crate::config::Config;
use crate::endpoints::{validate_id, Endpoint};
use crate::error::ApiError;
use crate::models::{TaskAction, Ticket};
use crate::session::{ApiRequest, ApiResponse, Session};
use crate::tickets::{DeskRoutes, TicketDesk};
use crate::workflow::WorkflowResolver;

const ROUTES: DeskRoutes = DeskRoutes {
    workflows: Endpoint::OptimizerWorkflows,
    ticket: Endpoint::OptimizerTicket,
};

/// Client for Policy Optimizer tickets in one workflow.
pub struct PolicyOptimizerClient {
    desk: TicketDesk,
}

impl PolicyOptimizerClient {
    /// Creates a client and resolves the workflow by name.
    pub async fn connect(
        session: Session,
        domain_id: impl Into<String>,
        workflow_name: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let desk = TicketDesk::connect(session, domain_id, workflow_name, ROUTES).await?;
        Ok(Self { desk })
    }

    /// Logs in and connects using the configured domain and workflow.
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

    /// Creates a ticket.
    pub async fn create_ticket(&self, body: Value) -> Result<ApiResponse, ApiError> {
        let domain_id = self.desk.domain_id();
        let url = self
            .desk
            .session()
            .url(Endpoint::OptimizerTicketCreate, &[&domain_id])?;
        self.desk.execute(ApiRequest::post(url).json(body)).await
    }

    /// Fetches a ticket and records its current stage ids.
    pub async fn pull_ticket(&mut self, ticket_id: &str) -> Result<Ticket, ApiError> {
        self.desk.pull_ticket(ticket_id).await
    }

    /// Assigns the ticket's current stage to a user.
    pub async fn assign(&mut self, ticket_id: &str, user_id: &str) -> Result<ApiResponse, ApiError> {
        validate_id(user_id, "user_id")?;
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let workflow_id = self.desk.workflow_id().await?;
        let domain_id = self.desk.domain_id();
        let url = self.desk.session().url(
            Endpoint::OptimizerAssign,
            &[
                &domain_id,
                &workflow_id,
                &ids.workflow_task_id,
                &ticket_id,
                &ids.workflow_packet_task_id,
            ],
        )?;
        self.desk.execute(ApiRequest::put(url).text(user_id)).await
    }

    /// Completes the ticket with a review decision.
    pub async fn complete(&mut self, ticket_id: &str, decision: Value) -> Result<ApiResponse, ApiError> {
        self.act(ticket_id, TaskAction::Complete, decision).await
    }

    /// Cancels the ticket.
    pub async fn cancel(&mut self, ticket_id: &str) -> Result<ApiResponse, ApiError> {
        self.act(ticket_id, TaskAction::Cancelled, json!({})).await
    }

    async fn act(
        &mut self,
        ticket_id: &str,
        mode: TaskAction,
        body: Value,
    ) -> Result<ApiResponse, ApiError> {
        let ids = self.desk.refresh_stage(ticket_id).await?;
        let workflow_id = self.desk.workflow_id().await?;
        let domain_id = self.desk.domain_id();
        let url = self.desk.session().url(
            Endpoint::OptimizerTaskAction,
            &[
                &domain_id,
                &workflow_id,
                &ids.workflow_task_id,
                &ticket_id,
                &ids.workflow_packet_task_id,
                &mode,
            ],
        )?;

        let response = self.desk.execute(ApiRequest::put(url).json(body)).await?;
        tracing::info!(ticket_id = %ticket_id, mode = %mode, "Closed Policy Optimizer ticket");
        Ok(response)
    }

    /// Runs a SIQL ticket search with caller-supplied query parameters.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let results = optimizer
    ///     .search_tickets(&[("q", "ticket { status = 'Review' }"), ("pageSize", "20")])
    ///     .await?;
    /// ```
    pub async fn search_tickets(&self, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        let domain_id = self.desk.domain_id();
        let url = self
            .desk
            .session()
            .url(Endpoint::OptimizerTicketSearch, &[&domain_id])?;
        self.desk
            .execute(ApiRequest::get(url).query_pairs(params.iter().copied()))
            .await?
            .decode("ticket search results")
    }

    /// Ends the session.
    pub async fn logout(self) -> Result<ApiResponse, ApiError> {
        self.desk.into_session().logout().await
    }
}
