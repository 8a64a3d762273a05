//! Shared state of the ticket clients.
//!
//! `TicketDesk` owns the session, the resolved workflow and the stage
//! tracker. Every stage-dependent action goes through
//! [`TicketDesk::refresh_stage`], which re-fetches the ticket and derives the
//! current stage ids before the action URL is built, so ids from an earlier
//! fetch are never reused.

use crate::endpoints::{validate_id, Endpoint};
use crate::error::ApiError;
use crate::models::Ticket;
use crate::session::{ApiRequest, ApiResponse, Session};
use crate::stage::{StageIds, StageTracker};
use crate::workflow::WorkflowResolver;

/// Endpoints that differ between the ticket products.
#[derive(Debug, Clone, Copy)]
pub struct DeskRoutes {
    /// Workflow listing. Args: domain.
    pub workflows: Endpoint,
    /// A single ticket. Args: domain, workflow, ticket.
    pub ticket: Endpoint,
}

/// Session, workflow and stage state for one ticket product.
pub struct TicketDesk {
    session: Session,
    domain_id: String,
    workflow: WorkflowResolver,
    stage: StageTracker,
    routes: DeskRoutes,
}

impl TicketDesk {
    /// Creates a desk and resolves the workflow.
    ///
    /// A workflow that cannot be resolved makes every ticket action
    /// impossible, so it fails construction.
    pub async fn connect(
        session: Session,
        domain_id: impl Into<String>,
        workflow_name: impl Into<String>,
        routes: DeskRoutes,
    ) -> Result<Self, ApiError> {
        let desk = Self::with_resolver(
            session,
            domain_id,
            WorkflowResolver::new(routes.workflows, workflow_name),
            routes,
        );
        desk.workflow_id().await?;
        Ok(desk)
    }

    /// Creates a desk around an existing resolver without contacting the server.
    pub fn with_resolver(
        session: Session,
        domain_id: impl Into<String>,
        workflow: WorkflowResolver,
        routes: DeskRoutes,
    ) -> Self {
        Self {
            session,
            domain_id: domain_id.into(),
            workflow,
            stage: StageTracker::new(),
            routes,
        }
    }

    /// Returns the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the domain id.
    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    /// Returns the workflow name.
    pub fn workflow_name(&self) -> &str {
        self.workflow.name()
    }

    /// Returns the stage ids derived by the most recent fetch.
    pub fn stage(&self) -> &StageTracker {
        &self.stage
    }

    /// Returns the workflow id, resolving it on first use.
    pub async fn workflow_id(&self) -> Result<String, ApiError> {
        self.workflow
            .resolve(&self.session, &self.domain_id)
            .await
            .map(str::to_owned)
    }

    /// Executes a request on the session.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.session.execute(request).await
    }

    /// Fetches a ticket and updates the stage tracker from it.
    ///
    /// A ticket without an open task for its stage is returned normally; the
    /// tracker then keeps its previous ids.
    pub async fn pull_ticket(&mut self, ticket_id: &str) -> Result<Ticket, ApiError> {
        let ticket = self.fetch_ticket(ticket_id).await?;
        self.stage.update_from(&ticket);
        Ok(ticket)
    }

    async fn fetch_ticket(&self, ticket_id: &str) -> Result<Ticket, ApiError> {
        validate_id(ticket_id, "ticket_id")?;
        let workflow_id = self.workflow_id().await?;
        let url = self
            .session
            .url(self.routes.ticket, &[&self.domain_id, &workflow_id, &ticket_id])?;

        self.session
            .execute(ApiRequest::get(url))
            .await?
            .decode("ticket")
    }

    /// Fetches a ticket and returns the ids of its current stage.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::StageTaskNotFound` if the fresh ticket has no open
    /// task for its current stage.
    pub async fn refresh_stage(&mut self, ticket_id: &str) -> Result<StageIds, ApiError> {
        let ticket = self.fetch_ticket(ticket_id).await?;

        match self.stage.update_from(&ticket) {
            Some(ids) => {
                tracing::debug!(
                    ticket_id = %ticket_id,
                    status = %ticket.status,
                    workflow_task_id = %ids.workflow_task_id,
                    workflow_packet_task_id = %ids.workflow_packet_task_id,
                    "Derived current stage"
                );
                Ok(ids)
            }
            None => Err(ApiError::StageTaskNotFound {
                ticket_id: ticket_id.to_string(),
                status: ticket.status,
            }),
        }
    }

    /// Consumes the desk and returns its session.
    pub fn into_session(self) -> Session {
        self.session
    }
}
