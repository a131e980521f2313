//! Core record types for users, dive sites and dives
//!
//! Records are what the store hands back after a write or a listing,
//! server-assigned fields included. `New*` types are validated payloads:
//! the only way to build one from caller input is through
//! [`crate::validate`], so a repository never sees unchecked data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned row identifier
pub type RecordId = i64;

/// A registered diver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub full_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named dive location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiveSite {
    pub id: RecordId,
    pub name: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Free-form label, e.g. "beginner" or "advanced"
    pub difficulty: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single logged dive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dive {
    pub id: RecordId,
    pub user_id: RecordId,
    pub site_id: Option<RecordId>,
    pub club_id: Option<RecordId>,
    pub instructor_id: Option<RecordId>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_depth_m: Option<f64>,
    pub avg_depth_m: Option<f64>,
    pub water_temp_c: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated payload for creating a user
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub(crate) full_name: String,
    pub(crate) email: Option<String>,
}

impl NewUser {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Validated payload for creating a dive site
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiveSite {
    pub(crate) name: String,
    pub(crate) country: Option<String>,
    pub(crate) region: Option<String>,
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
    pub(crate) difficulty: Option<String>,
}

impl NewDiveSite {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    pub fn difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }
}

/// Validated payload for creating a dive
///
/// Time ordering and depth ordering are not checked here; the store's
/// check constraints enforce them.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDive {
    pub(crate) user_id: RecordId,
    pub(crate) site_id: Option<RecordId>,
    pub(crate) club_id: Option<RecordId>,
    pub(crate) instructor_id: Option<RecordId>,
    pub(crate) start_time: DateTime<Utc>,
    pub(crate) end_time: DateTime<Utc>,
    pub(crate) max_depth_m: Option<f64>,
    pub(crate) avg_depth_m: Option<f64>,
    pub(crate) water_temp_c: Option<f64>,
    pub(crate) notes: Option<String>,
}

impl NewDive {
    pub fn user_id(&self) -> RecordId {
        self.user_id
    }

    pub fn site_id(&self) -> Option<RecordId> {
        self.site_id
    }

    pub fn club_id(&self) -> Option<RecordId> {
        self.club_id
    }

    pub fn instructor_id(&self) -> Option<RecordId> {
        self.instructor_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn max_depth_m(&self) -> Option<f64> {
        self.max_depth_m
    }

    pub fn avg_depth_m(&self) -> Option<f64> {
        self.avg_depth_m
    }

    pub fn water_temp_c(&self) -> Option<f64> {
        self.water_temp_c
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Dive listing limits
pub mod limits {
    pub const MIN_DIVE_LIMIT: i64 = 1;
    pub const MAX_DIVE_LIMIT: i64 = 500;
    pub const DEFAULT_DIVE_LIMIT: i64 = 100;
}

/// Parameters for listing dives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiveQuery {
    limit: i64,
}

impl DiveQuery {
    /// Build a query, clamping the requested limit into
    /// `[MIN_DIVE_LIMIT, MAX_DIVE_LIMIT]`. Absent means the default.
    pub fn new(requested: Option<i64>) -> Self {
        let limit = requested
            .unwrap_or(limits::DEFAULT_DIVE_LIMIT)
            .clamp(limits::MIN_DIVE_LIMIT, limits::MAX_DIVE_LIMIT);
        Self { limit }
    }

    /// Effective, already clamped limit
    pub fn limit(&self) -> i64 {
        self.limit
    }
}

impl Default for DiveQuery {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dive_query_defaults_to_100() {
        assert_eq!(DiveQuery::default().limit(), 100);
        assert_eq!(DiveQuery::new(None).limit(), 100);
    }

    #[test]
    fn dive_query_clamps_low_and_high() {
        assert_eq!(DiveQuery::new(Some(0)), DiveQuery::new(Some(1)));
        assert_eq!(DiveQuery::new(Some(-40)).limit(), 1);
        assert_eq!(DiveQuery::new(Some(10_000)), DiveQuery::new(Some(500)));
        assert_eq!(DiveQuery::new(Some(i64::MAX)).limit(), 500);
        assert_eq!(DiveQuery::new(Some(37)).limit(), 37);
    }

    #[test]
    fn dive_record_serde() {
        let json = r#"{
            "id": 7,
            "user_id": 1,
            "site_id": null,
            "club_id": null,
            "instructor_id": null,
            "start_time": "2024-05-01T09:00:00Z",
            "end_time": "2024-05-01T10:00:00Z",
            "max_depth_m": 18.0,
            "avg_depth_m": 12.0,
            "water_temp_c": null,
            "notes": null,
            "created_at": "2024-05-01T10:05:00Z",
            "updated_at": "2024-05-01T10:05:00Z"
        }"#;
        let dive: Dive = serde_json::from_str(json).unwrap();

        assert_eq!(dive.id, 7);
        assert_eq!(dive.max_depth_m, Some(18.0));
        assert_eq!((dive.end_time - dive.start_time).num_seconds(), 3600);
    }
}
