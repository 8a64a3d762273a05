//! Wire models for the Security Manager, Policy Planner and Policy
//! Optimizer APIs.
//!
//! Only the shapes the client depends on are typed. Decoding a response
//! into these types fails fast with `ApiError::Decode` when the server sends
//! something else.

mod common;
mod query;
mod requirement;
mod route;
mod ticket;

pub use common::{IdListing, IdRef};
pub use query::*;
pub use requirement::*;
pub use route::*;
pub use ticket::*;
