//! Request validators
//!
//! Inbound request bodies are decoded into the `Create*Request` types and
//! then checked here before any statement is attempted. Only shape-level
//! rules live here: presence, non-empty text, email syntax, finite numbers.
//! Data-level rules (uniqueness, references, time and depth ordering) are
//! left to the store.

use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;

use crate::error::ValidationError;
use crate::types::{DiveQuery, NewDive, NewDiveSite, NewUser, RecordId};

/// Body of a create-user request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a create-dive-site request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDiveSiteRequest {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Body of a create-dive request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDiveRequest {
    pub user_id: RecordId,
    #[serde(default)]
    pub site_id: Option<RecordId>,
    #[serde(default)]
    pub club_id: Option<RecordId>,
    #[serde(default)]
    pub instructor_id: Option<RecordId>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub max_depth_m: Option<f64>,
    #[serde(default)]
    pub avg_depth_m: Option<f64>,
    #[serde(default)]
    pub water_temp_c: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query string of a list-dives request. `limit` stays raw text so an
/// out-of-range integer can be clamped instead of rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDivesParams {
    #[serde(default)]
    pub limit: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        let full_name = required_text("full_name", self.full_name)?;
        // Only a missing or null email is absent; blank text is not an address
        let email = match self.email.as_deref().map(str::trim) {
            Some(email) if is_valid_email(email) => Some(email.to_string()),
            Some(_) => return Err(ValidationError::InvalidEmail { field: "email" }),
            None => None,
        };
        Ok(NewUser { full_name, email })
    }
}

impl CreateDiveSiteRequest {
    pub fn validate(self) -> Result<NewDiveSite, ValidationError> {
        Ok(NewDiveSite {
            name: required_text("name", self.name)?,
            country: optional_text(self.country),
            region: optional_text(self.region),
            latitude: finite("latitude", self.latitude)?,
            longitude: finite("longitude", self.longitude)?,
            difficulty: optional_text(self.difficulty),
        })
    }
}

impl CreateDiveRequest {
    pub fn validate(self) -> Result<NewDive, ValidationError> {
        Ok(NewDive {
            user_id: self.user_id,
            site_id: self.site_id,
            club_id: self.club_id,
            instructor_id: self.instructor_id,
            start_time: to_store_precision(self.start_time),
            end_time: to_store_precision(self.end_time),
            max_depth_m: finite("max_depth_m", self.max_depth_m)?,
            avg_depth_m: finite("avg_depth_m", self.avg_depth_m)?,
            water_temp_c: finite("water_temp_c", self.water_temp_c)?,
            notes: optional_text(self.notes),
        })
    }
}

impl ListDivesParams {
    /// Coerce the raw limit into a [`DiveQuery`]. Integers of any size are
    /// clamped; only non-integer text is rejected.
    pub fn validate(self) -> Result<DiveQuery, ValidationError> {
        let Some(raw) = optional_text(self.limit) else {
            return Ok(DiveQuery::default());
        };
        let requested = match raw.parse::<i64>() {
            Ok(n) => n,
            Err(e) => match e.kind() {
                std::num::IntErrorKind::PosOverflow => i64::MAX,
                std::num::IntErrorKind::NegOverflow => i64::MIN,
                _ => {
                    return Err(ValidationError::NotInteger {
                        field: "limit",
                        value: raw,
                    })
                }
            },
        };
        Ok(DiveQuery::new(Some(requested)))
    }
}

fn required_text(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Timestamps are stored with microsecond resolution
fn to_store_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

fn finite(field: &'static str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NotFinite { field }),
        other => Ok(other),
    }
}

/// Syntactic email check: one `@`, a non-empty local part without spaces,
/// and a dotted domain whose labels are alphanumeric or `-`.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
