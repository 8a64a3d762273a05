//! Security Manager client: devices, SIQL, objects, users and supplemental
//! routes.
//!
//! Most operations are thin pass-throughs returning the server's JSON. The
//! supplemental route import is the exception: it validates rows locally
//! and keeps going past failed rows, returning a [`BulkReport`].

use serde_json::{json, Value};

use crate::bulk::BulkReport;
use crate::config::Config;
use crate::endpoints::{validate_id, Endpoint};
use crate::error::ApiError;
use crate::models::{FirewallObjectType, SiqlTarget, SupplementalRoute};
use crate::session::{ApiRequest, ApiResponse, Session};

/// Client for Security Manager endpoints in one domain.
pub struct SecurityManagerClient {
    session: Session,
    domain_id: String,
}

impl SecurityManagerClient {
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

    /// Returns the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the domain id.
    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    async fn get_json(&self, request: ApiRequest, context: &str) -> Result<Value, ApiError> {
        self.session.execute(request).await?.decode(context)
    }

    // ========================================================================
    // Devices
    // ========================================================================

    /// Lists the domain's devices.
    pub async fn get_devices(&self) -> Result<Value, ApiError> {
        let url = self.session.url(Endpoint::Devices, &[&self.domain_id])?;
        self.get_json(ApiRequest::get(url), "devices").await
    }

    /// Returns one device.
    pub async fn get_device(&self, device_id: &str) -> Result<Value, ApiError> {
        validate_id(device_id, "device_id")?;
        let url = self
            .session
            .url(Endpoint::Device, &[&self.domain_id, &device_id])?;
        self.get_json(ApiRequest::get(url), "device").await
    }

    /// Triggers a manual configuration retrieval for a device.
    pub async fn manual_device_retrieval(&self, device_id: &str) -> Result<ApiResponse, ApiError> {
        validate_id(device_id, "device_id")?;
        let url = self
            .session
            .url(Endpoint::DeviceRetrieval, &[&self.domain_id, &device_id])?;
        self.session.execute(ApiRequest::post(url).json(json!({}))).await
    }

    /// Runs a SIQL query against one object type.
    pub async fn siql_query(
        &self,
        target: SiqlTarget,
        query: &str,
        page_size: u32,
    ) -> Result<Value, ApiError> {
        let url = self.session.url(Endpoint::Siql, &[&target])?;
        let request = ApiRequest::get(url)
            .query("q", query)
            .query("pageSize", page_size);
        self.get_json(request, "SIQL results").await
    }

    // ========================================================================
    // Device groups
    // ========================================================================

    /// Creates a device group.
    pub async fn create_device_group(&self, name: &str) -> Result<ApiResponse, ApiError> {
        let url = self.session.url(Endpoint::DeviceGroups, &[&self.domain_id])?;
        let body = json!({ "name": name, "domainId": self.domain_id });
        self.session.execute(ApiRequest::post(url).json(body)).await
    }

    /// Adds a device to a device group.
    pub async fn add_to_device_group(
        &self,
        device_group_id: &str,
        device_id: &str,
    ) -> Result<ApiResponse, ApiError> {
        validate_id(device_group_id, "device_group_id")?;
        validate_id(device_id, "device_id")?;
        let url = self.session.url(
            Endpoint::DeviceGroupMember,
            &[&self.domain_id, &device_group_id, &device_id],
        )?;
        self.session.execute(ApiRequest::post(url)).await
    }

    /// Looks a device group up by name.
    pub async fn get_device_group_by_name(&self, name: &str) -> Result<Value, ApiError> {
        let url = self
            .session
            .url(Endpoint::DeviceGroupByName, &[&self.domain_id, &name])?;
        self.get_json(ApiRequest::get(url), "device group").await
    }

    // ========================================================================
    // Zones, objects and rule documentation
    // ========================================================================

    /// Lists a device's zones.
    pub async fn zone_search(&self, device_id: &str, page_size: u32) -> Result<Value, ApiError> {
        validate_id(device_id, "device_id")?;
        let url = self
            .session
            .url(Endpoint::Zones, &[&self.domain_id, &device_id])?;
        self.get_json(ApiRequest::get(url).query("pageSize", page_size), "zones")
            .await
    }

    /// Returns a firewall object by type and match id.
    pub async fn get_firewall_object(
        &self,
        object_type: FirewallObjectType,
        device_id: &str,
        match_id: &str,
    ) -> Result<Value, ApiError> {
        validate_id(device_id, "device_id")?;
        let url = self.session.url(
            Endpoint::FirewallObject,
            &[&object_type, &device_id, &match_id],
        )?;
        self.get_json(ApiRequest::get(url), "firewall object").await
    }

    /// Returns the documentation of one rule.
    pub async fn get_rule_doc(&self, device_id: &str, rule_id: &str) -> Result<Value, ApiError> {
        validate_id(device_id, "device_id")?;
        let url = self
            .session
            .url(Endpoint::RuleDoc, &[&self.domain_id, &device_id, &rule_id])?;
        self.get_json(ApiRequest::get(url), "rule documentation").await
    }

    /// Updates rule documentation on a device.
    pub async fn update_rule_doc(&self, device_id: &str, rule_doc: Value) -> Result<ApiResponse, ApiError> {
        validate_id(device_id, "device_id")?;
        let url = self
            .session
            .url(Endpoint::RuleDocUpdate, &[&self.domain_id, &device_id])?;
        self.session.execute(ApiRequest::put(url).json(rule_doc)).await
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Lists users.
    pub async fn get_users(&self, page_size: u32) -> Result<Value, ApiError> {
        let url = self.session.url(Endpoint::Users, &[&self.domain_id])?;
        self.get_json(ApiRequest::get(url).query("pageSize", page_size), "users")
            .await
    }

    /// Searches users by username.
    pub async fn get_user_by_username(&self, username: &str, page_size: u32) -> Result<Value, ApiError> {
        let url = self.session.url(Endpoint::Users, &[&self.domain_id])?;
        let request = ApiRequest::get(url)
            .query("pageSize", page_size)
            .query("search", username);
        self.get_json(request, "users").await
    }

    /// Lists user groups.
    pub async fn get_user_groups(&self, page_size: u32) -> Result<Value, ApiError> {
        let url = self.session.url(Endpoint::UserGroups, &[&self.domain_id])?;
        self.get_json(ApiRequest::get(url).query("pageSize", page_size), "user groups")
            .await
    }

    /// Lists the users in a group.
    pub async fn get_users_in_group(&self, user_group_id: &str, page_size: u32) -> Result<Value, ApiError> {
        validate_id(user_group_id, "user_group_id")?;
        let url = self
            .session
            .url(Endpoint::UserGroupMembers, &[&self.domain_id, &user_group_id])?;
        self.get_json(ApiRequest::get(url).query("pageSize", page_size), "group users")
            .await
    }

    /// Adds a user to a group.
    pub async fn add_user_to_group(&self, user_group_id: &str, user_id: &str) -> Result<ApiResponse, ApiError> {
        validate_id(user_group_id, "user_group_id")?;
        validate_id(user_id, "user_id")?;
        let url = self.session.url(
            Endpoint::UserGroupMember,
            &[&self.domain_id, &user_group_id, &user_id],
        )?;
        self.session.execute(ApiRequest::post(url)).await
    }

    // ========================================================================
    // Supplemental routes
    // ========================================================================

    /// Adds a supplemental route to its device.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` without contacting the server if the
    /// route sets both or neither of interface and virtual router.
    pub async fn add_supplemental_route(&self, route: &SupplementalRoute) -> Result<ApiResponse, ApiError> {
        route.validate()?;
        let url = self
            .session
            .url(Endpoint::SupplementalRoute, &[&route.device_id])?;
        let body = serde_json::to_value(route)?;
        self.session.execute(ApiRequest::post(url).json(body)).await
    }

    /// Imports supplemental routes from CSV text.
    ///
    /// The first line is a header and is skipped; blank lines are ignored.
    /// Every other record is recorded in the report under `line N` (1-based,
    /// the line the record starts on), whether it failed to parse, failed to
    /// submit or succeeded.
    pub async fn bulk_add_supplemental_routes(&self, input: &str) -> BulkReport {
        tracing::info!("Starting bulk supplemental route import");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input.as_bytes());

        let mut report = BulkReport::new();
        for record in reader.records() {
            let line = match &record {
                Ok(record) => record.position(),
                Err(e) => e.position(),
            }
            .map(|position| position.line())
            .unwrap_or_default();

            let result = match record {
                Ok(record) if is_blank(&record) => continue,
                Ok(record) => match SupplementalRoute::from_record(&record) {
                    Ok(route) => self
                        .add_supplemental_route(&route)
                        .await
                        .map(|response| response.status()),
                    Err(e) => Err(e),
                },
                Err(e) => Err(e.into()),
            };

            match &result {
                Ok(status) => tracing::debug!(line, status = %status, "Imported route"),
                Err(e) => tracing::warn!(line, error = %e, "Failed to import route"),
            }
            report.record(format!("line {}", line), result);
        }

        tracing::info!(summary = %report.summary(), "Finished bulk supplemental route import");
        report
    }

    /// Ends the session.
    pub async fn logout(self) -> Result<ApiResponse, ApiError> {
        self.session.logout().await
    }
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}
