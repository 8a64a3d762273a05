//! Enumerations used to build queries: assessment controls, SIQL targets
//! and firewall object types.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the wire value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ApiError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ApiError::validation(format!("unknown {} {:?}", $what, s)))
            }
        }
    };
}

wire_enum! {
    /// Pre-change assessment control.
    ControlType, "control type" {
        /// Allowed services check.
        AllowedServices => "ALLOWED_SERVICES",
        /// Change window violation check.
        ChangeWindowViolation => "CHANGE_WINDOW_VIOLATION",
        /// Device access analysis.
        DeviceAccessAnalysis => "DEVICE_ACCESS_ANALYSIS",
        /// Device property check.
        DeviceProperty => "DEVICE_PROPERTY",
        /// Device status check.
        DeviceStatus => "DEVICE_STATUS",
        /// Network access analysis.
        NetworkAccessAnalysis => "NETWORK_ACCESS_ANALYSIS",
        /// Regular expression match.
        Regex => "REGEX",
        /// Multi-pattern regular expression match.
        RegexMultipattern => "REGEX_MULITPATTERN",
        /// Rule search.
        RuleSearch => "RULE_SEARCH",
        /// Rule usage.
        RuleUsage => "RULE_USAGE",
        /// Service risk analysis.
        ServiceRiskAnalysis => "SERVICE_RISK_ANALYSIS",
        /// Zone matrix check.
        ZoneMatrix => "ZONE_MATRIX",
        /// Zone-based rule search.
        ZoneBasedRuleSearch => "ZONE_BASED_RULE_SEARCH",
    }
}

wire_enum! {
    /// Object type searched by a SIQL query.
    SiqlTarget, "SIQL target" {
        /// Security rules.
        SecurityRule => "secrule",
        /// Policies.
        Policy => "policy",
        /// Service objects.
        ServiceObject => "serviceobj",
        /// Network objects.
        NetworkObject => "networkobj",
        /// Devices.
        Device => "device",
    }
}

wire_enum! {
    /// Firewall object type.
    FirewallObjectType, "firewall object type" {
        /// Network object.
        Network => "NETWORK",
        /// Service object.
        Service => "SERVICE",
        /// Zone.
        Zone => "ZONE",
        /// Application.
        App => "APP",
        /// Security profile.
        Profile => "PROFILE",
        /// Schedule.
        Schedule => "SCHEDULE",
        /// URL matcher.
        UrlMatcher => "URL_MATCHER",
        /// User.
        User => "USER",
    }
}

/// Parses a comma-delimited list of control types.
///
/// # Errors
///
/// Returns `ApiError::Validation` for any unknown control name.
pub fn parse_controls(list: &str) -> Result<Vec<ControlType>, ApiError> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_controls() {
        let controls = parse_controls("RULE_SEARCH, zone_matrix").unwrap();
        assert_eq!(controls, vec![ControlType::RuleSearch, ControlType::ZoneMatrix]);
    }

    #[test]
    fn test_parse_controls_rejects_unknown() {
        let err = parse_controls("RULE_SEARCH,BOGUS").unwrap_err();
        assert!(err.to_string().contains("BOGUS"));
    }

    #[test]
    fn test_siql_target_wire_values() {
        assert_eq!(SiqlTarget::SecurityRule.to_string(), "secrule");
        assert_eq!("networkobj".parse::<SiqlTarget>().unwrap(), SiqlTarget::NetworkObject);
    }

    #[test]
    fn test_firewall_object_type_from_str() {
        assert_eq!(
            "url_matcher".parse::<FirewallObjectType>().unwrap(),
            FirewallObjectType::UrlMatcher
        );
        assert!("TUNNEL".parse::<FirewallObjectType>().is_err());
    }
}
