//! Orchestration client: rule recommendation and device-level PCA.

use serde_json::Value;

use crate::config::Config;
use crate::endpoints::{validate_id, Endpoint};
use crate::error::ApiError;
use crate::models::ControlType;
use crate::session::{ApiRequest, ApiResponse, Session};

/// Controls run by [`OrchestrationClient::device_pca`].
pub const DEVICE_PCA_CONTROLS: [ControlType; 5] = [
    ControlType::RuleSearch,
    ControlType::AllowedServices,
    ControlType::ServiceRiskAnalysis,
    ControlType::DeviceAccessAnalysis,
    ControlType::NetworkAccessAnalysis,
];

/// Client for the orchestration endpoints in one domain.
pub struct OrchestrationClient {
    session: Session,
    domain_id: String,
}

impl OrchestrationClient {
    /// Creates a client on an existing session.
    pub fn new(session: Session, domain_id: impl Into<String>) -> Self {
        Self {
            session,
            domain_id: domain_id.into(),
        }
    }

    /// Logs in and creates a client for the configured domain.
    pub async fn from_config(config: &Config) -> Result<Self, ApiError> {
        let session = Session::login(config).await?;
        Ok(Self::new(session, config.domain_id.clone()))
    }

    /// Requests rule recommendations for an access requirement.
    pub async fn rule_recommendation(
        &self,
        params: &[(&str, &str)],
        requirement: Value,
    ) -> Result<Value, ApiError> {
        let url = self
            .session
            .url(Endpoint::RuleRecommendation, &[&self.domain_id])?;
        let request = ApiRequest::post(url)
            .query_pairs(params.iter().copied())
            .json(requirement);
        self.session
            .execute(request)
            .await?
            .decode("rule recommendations")
    }

    /// Runs a pre-change assessment of proposed changes on one device.
    pub async fn device_pca(&self, device_id: &str, changes: Value) -> Result<Value, ApiError> {
        validate_id(device_id, "device_id")?;
        let url = self
            .session
            .url(Endpoint::DevicePca, &[&self.domain_id, &device_id])?;
        let request = ApiRequest::post(url)
            .query_pairs(DEVICE_PCA_CONTROLS.iter().map(|c| ("controlType", c.as_str())))
            .json(changes);
        self.session.execute(request).await?.decode("device PCA results")
    }

    /// Ends the session.
    pub async fn logout(self) -> Result<ApiResponse, ApiError> {
        self.session.logout().await
    }
}
