//! # secmgr
//!
//! Client library for the Security Manager REST API and the Policy Planner,
//! Policy Optimizer and orchestration services that run beside it.
//!
//! ## Features
//!
//! - **Sessions**: Log in once, send the token with every request, log out
//! - **Workflows**: Resolve a workflow name to its id once per client
//! - **Ticket stages**: Re-fetch a ticket before every stage-dependent action
//!   and derive the current stage ids from its task list
//! - **Bulk import**: Supplemental routes from delimited text, with a
//!   per-line report instead of aborting on the first bad row
//! - **Security**: The password and token are never logged and are
//!   redacted from error bodies
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - The `ApiError` type
//! - [`endpoints`] - Positional URL templates
//! - [`session`] - Login, authenticated requests, logout
//! - [`models`] - Wire shapes for tickets, workflows, routes and requirements
//! - [`workflow`] - Workflow name to id resolution
//! - [`stage`] - Current stage derivation
//! - [`tickets`] - Shared state of the ticket clients
//! - [`policy_planner`], [`policy_optimizer`] - Ticket clients
//! - [`security_manager`], [`orchestration`] - Pass-through clients
//! - [`bulk`] - Per-item outcomes of bulk operations
//!
//! ## Configuration
//!
//! - `SECMGR_HOST`: Base URL of the server
//! - `SECMGR_USERNAME`, `SECMGR_PASSWORD`: Login credentials
//!
//! Optional:
//! - `SECMGR_VERIFY_TLS`: Verify the server certificate (default `true`)
//! - `SECMGR_SUPPRESS_TLS_WARNING`: Silence the unverified-TLS warning
//! - `SECMGR_DOMAIN_ID`: Domain id (default `1`)
//! - `SECMGR_WORKFLOW`: Workflow name for the ticket clients
//! - `RUST_LOG`: Log level (e.g., `secmgr=debug`)
//!
//! ## Example
//!
//! ```ignore
//! use secmgr::config::Config;
//! use secmgr::models::TaskAction;
//! use secmgr::policy_planner::PolicyPlannerClient;
//!
//! async fn example() -> Result<(), secmgr::error::ApiError> {
//!     let config = Config::from_env()?;
//!     let mut planner = PolicyPlannerClient::from_config(&config).await?;
//!
//!     let ticket = planner.pull_ticket("42").await?;
//!     if !secmgr::policy_planner::is_assigned(&ticket) {
//!         planner.assign("42", "7").await?;
//!     }
//!     planner.complete_task("42", TaskAction::Submit, None).await?;
//!
//!     planner.logout().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bulk;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod orchestration;
pub mod policy_optimizer;
pub mod policy_planner;
pub mod security_manager;
pub mod session;
pub mod stage;
pub mod tickets;
pub mod workflow;

pub use bulk::BulkReport;
pub use config::Config;
pub use error::ApiError;
pub use session::Session;
