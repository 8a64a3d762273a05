//! Policy Planner requirement and attachment models.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// How uploaded requirements combine with the existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequirementBehavior {
    /// Add to the existing requirements.
    #[default]
    Append,
    /// Replace all existing requirements.
    Replace,
}

/// Server-side parse result of a requirement CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedRequirements {
    /// One entry per parsed row, each with its requirement and any errors.
    #[serde(rename = "policyPlanRequirementErrorDTOs")]
    pub entries: Vec<ParsedRequirement>,
}

/// One parsed CSV row.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedRequirement {
    /// The requirement as the server understood it.
    #[serde(rename = "policyPlanRequirementDTO")]
    pub requirement: serde_json::Value,

    /// Parse diagnostics and other fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ParsedRequirements {
    /// Drops the diagnostics and keeps only the requirements.
    pub fn into_requirements(self) -> RequirementSet {
        RequirementSet {
            requirements: self
                .entries
                .into_iter()
                .map(|entry| entry.requirement)
                .collect(),
        }
    }
}

/// Body for adding or replacing requirements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequirementSet {
    /// Requirements to submit.
    pub requirements: Vec<serde_json::Value>,
}

impl RequirementSet {
    /// Converts to the JSON request body.
    pub fn to_json(&self) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(self).map_err(ApiError::Serialization)
    }
}

/// Sets the description of the first staged attachment.
///
/// # Errors
///
/// Returns `ApiError::UnexpectedResponse` if the staged response has no
/// `attachments` array or it is empty.
pub fn describe_staged_attachment(
    staged: &mut serde_json::Value,
    description: &str,
) -> Result<(), ApiError> {
    let first = staged
        .get_mut("attachments")
        .and_then(|a| a.as_array_mut())
        .and_then(|a| a.first_mut())
        .and_then(|a| a.as_object_mut())
        .ok_or_else(|| {
            ApiError::UnexpectedResponse("staged attachment response has no attachments".into())
        })?;

    first.insert(
        "description".to_string(),
        serde_json::Value::String(description.to_string()),
    );
    Ok(())
}
