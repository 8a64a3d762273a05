//! Workflow name resolution.
//!
//! Ticket endpoints are addressed by workflow id, while callers know the
//! workflow by name. The resolver looks the name up once and caches the id
//! for the lifetime of the client; it never re-resolves.

use tokio::sync::OnceCell;

use crate::endpoints::Endpoint;
use crate::error::ApiError;
use crate::models::{Workflow, WorkflowEntry, WorkflowPage};
use crate::session::{ApiRequest, Session};

/// Page size the server uses when none is requested.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Resolves a workflow name to its id, once.
#[derive(Debug)]
pub struct WorkflowResolver {
    listing: Endpoint,
    name: String,
    id: OnceCell<String>,
}

impl WorkflowResolver {
    /// Creates a resolver for `name` using the given listing endpoint.
    pub fn new(listing: Endpoint, name: impl Into<String>) -> Self {
        Self {
            listing,
            name: name.into(),
            id: OnceCell::new(),
        }
    }

    /// Creates a resolver whose id is already known; no lookup is made.
    pub fn with_id(listing: Endpoint, name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            listing,
            name: name.into(),
            id: OnceCell::new_with(Some(id.into())),
        }
    }

    /// Returns the workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the id if it has been resolved.
    pub fn cached(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    /// Returns the workflow id, looking it up on first use.
    ///
    /// The first page of the listing is fetched without paging parameters.
    /// If its `total` exceeds the server's default page size, the listing is
    /// fetched once more with `pageSize = total` so every workflow is seen.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::WorkflowNotFound` if no workflow has exactly this
    /// name. HTTP errors are propagated unchanged.
    pub async fn resolve(&self, session: &Session, domain_id: &str) -> Result<&str, ApiError> {
        self.id
            .get_or_try_init(|| self.lookup(session, domain_id))
            .await
            .map(String::as_str)
    }

    async fn lookup(&self, session: &Session, domain_id: &str) -> Result<String, ApiError> {
        let url = session.url(self.listing, &[&domain_id])?;

        let mut page: WorkflowPage = session
            .execute(ApiRequest::get(&url))
            .await?
            .decode("workflow listing")?;

        if page.total > DEFAULT_PAGE_SIZE {
            tracing::debug!(
                total = page.total,
                "Workflow listing exceeds default page, fetching all"
            );
            page = session
                .execute(
                    ApiRequest::get(&url)
                        .query("includeDisabled", false)
                        .query("pageSize", page.total),
                )
                .await?
                .decode("workflow listing")?;
        }

        let workflow = find_workflow(&page.results, &self.name).ok_or_else(|| {
            ApiError::WorkflowNotFound {
                name: self.name.clone(),
                domain_id: domain_id.to_string(),
            }
        })?;

        tracing::info!(workflow = %self.name, workflow_id = %workflow.id, "Resolved workflow");

        Ok(workflow.id.clone())
    }
}

/// Finds the first workflow whose name matches exactly.
pub fn find_workflow<'a>(entries: &'a [WorkflowEntry], name: &str) -> Option<&'a Workflow> {
    entries
        .iter()
        .map(|entry| &entry.workflow)
        .find(|workflow| workflow.name == name)
}
