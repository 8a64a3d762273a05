//! Supplemental route models.
//!
//! A supplemental route sends traffic either out of a named interface or to
//! a virtual router, never both. Routes are built from delimited import rows
//! with eight positional columns:
//!
//! | # | column |
//! |---|---|
//! | 0 | deviceId |
//! | 1 | interfaceName |
//! | 2 | destination |
//! | 3 | gateway |
//! | 4 | virtualRouter |
//! | 5 | nextVirtualRouter |
//! | 6 | metric |
//! | 7 | drop (`true`/`false`) |

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Number of columns in an import row.
pub const ROUTE_COLUMNS: usize = 8;

/// A supplemental route as sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementalRoute {
    /// Destination network.
    pub destination: String,

    /// Device the route belongs to.
    pub device_id: String,

    /// Whether matching traffic is dropped.
    pub drop: bool,

    /// Next-hop gateway.
    pub gateway: String,

    /// Egress interface, for interface routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,

    /// Route metric; sent as `null` when unset.
    #[serde(default)]
    pub metric: Option<i64>,

    /// Next virtual router, for virtual-router routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_virtual_router: Option<String>,

    /// Virtual router, for virtual-router routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_router: Option<String>,
}

impl SupplementalRoute {
    /// Checks that exactly one routing target is set.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if both an interface and a virtual
    /// router are present, or if neither has a value.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.interface_name.is_some() && self.virtual_router.is_some() {
            return Err(ApiError::validation(
                "supplemental routes cannot use both an interface and a virtual router",
            ));
        }

        let has_interface = self.interface_name.as_deref().is_some_and(|s| !s.is_empty());
        let has_router = self.virtual_router.as_deref().is_some_and(|s| !s.is_empty());
        if !has_interface && !has_router {
            return Err(ApiError::validation(
                "supplemental routes must use an interface or a virtual router",
            ));
        }

        Ok(())
    }

    /// Builds a route from one import row.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the row has the wrong number of
    /// columns, sets both or neither routing target, or has an unparsable
    /// metric or drop flag.
    pub fn from_row(fields: &[&str]) -> Result<Self, ApiError> {
        if fields.len() != ROUTE_COLUMNS {
            return Err(ApiError::validation(format!(
                "expected {} columns, got {}",
                ROUTE_COLUMNS,
                fields.len()
            )));
        }

        let field = |i: usize| fields[i].trim().to_string();
        let interface_name = field(1);
        let virtual_router = field(4);

        let route = if !interface_name.is_empty() {
            if !virtual_router.is_empty() {
                return Err(ApiError::validation(
                    "supplemental routes cannot use both an interface and a virtual router",
                ));
            }
            SupplementalRoute {
                destination: field(2),
                device_id: field(0),
                drop: parse_drop(fields[7])?,
                gateway: field(3),
                interface_name: Some(interface_name),
                metric: parse_metric(fields[6])?,
                next_virtual_router: None,
                virtual_router: None,
            }
        } else {
            SupplementalRoute {
                destination: field(2),
                device_id: field(0),
                drop: parse_drop(fields[7])?,
                gateway: field(3),
                interface_name: None,
                metric: parse_metric(fields[6])?,
                next_virtual_router: Some(field(5)),
                virtual_router: Some(virtual_router),
            }
        };

        route.validate()?;
        Ok(route)
    }

    /// Builds a route from a parsed CSV record.
    pub fn from_record(record: &csv::StringRecord) -> Result<Self, ApiError> {
        let fields: Vec<&str> = record.iter().collect();
        Self::from_row(&fields)
    }

    /// Parses one comma-delimited import line. Quoted fields are unquoted.
    pub fn from_line(line: &str) -> Result<Self, ApiError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let record = reader
            .records()
            .next()
            .transpose()?
            .ok_or_else(|| ApiError::validation("empty route row"))?;
        Self::from_record(&record)
    }
}

/// Empty metric means unset.
fn parse_metric(value: &str) -> Result<Option<i64>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::validation(format!("metric must be an integer, got {:?}", value)))
}

fn parse_drop(value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ApiError::validation(format!(
            "drop must be true or false, got {:?}",
            other
        ))),
    }
}
