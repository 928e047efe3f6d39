//! Road officials contact records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TITLE_EE: &str = "Executive Engineer";
pub const TITLE_AEE: &str = "Assistant Executive Engineer";
pub const TITLE_AE: &str = "Assistant Engineer";

/// One titled contact. Missing phone or email is an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Official {
    pub title: String,
    pub mobile: String,
    pub email: String,
}

impl Official {
    fn new(title: &str, mobile: Option<String>, email: Option<String>) -> Self {
        Self {
            title: title.to_string(),
            mobile: mobile.unwrap_or_default(),
            email: email.unwrap_or_default(),
        }
    }
}

/// The three engineers responsible for a network section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialsRoster {
    pub ee: Official,
    pub aee: Official,
    pub ae: Official,
}

/// Normalized defect-liability details for one network section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Officials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_starts_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_ends_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub officials: OfficialsRoster,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured_length: Option<f64>,
}

/// Result of a lookup, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialsLookup {
    pub data: Officials,
    pub cached: bool,
    /// When the record was fetched from the registry.
    pub fetched_at: DateTime<Utc>,
}

/// Registry response body. Every field is optional and may be null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistryResponse {
    road_starts_at: Option<String>,
    road_ends_at: Option<String>,
    division: Option<String>,
    sub_division: Option<String>,
    section: Option<String>,
    #[serde(rename = "mobileEE")]
    mobile_ee: Option<String>,
    #[serde(rename = "mobileAEE")]
    mobile_aee: Option<String>,
    #[serde(rename = "mobileAE")]
    mobile_ae: Option<String>,
    #[serde(rename = "emailEE")]
    email_ee: Option<String>,
    #[serde(rename = "emailAEE")]
    email_aee: Option<String>,
    #[serde(rename = "emailAE")]
    email_ae: Option<String>,
    measured_length: Option<serde_json::Value>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl RegistryResponse {
    /// Blank strings become absent; a non-numeric length is dropped.
    pub(crate) fn normalize(self) -> Officials {
        Officials {
            road_starts_at: non_empty(self.road_starts_at),
            road_ends_at: non_empty(self.road_ends_at),
            division: non_empty(self.division),
            sub_division: non_empty(self.sub_division),
            section: non_empty(self.section),
            officials: OfficialsRoster {
                ee: Official::new(TITLE_EE, self.mobile_ee, self.email_ee),
                aee: Official::new(TITLE_AEE, self.mobile_aee, self.email_aee),
                ae: Official::new(TITLE_AE, self.mobile_ae, self.email_ae),
            },
            measured_length: self.measured_length.as_ref().and_then(|v| v.as_f64()),
        }
    }
}
