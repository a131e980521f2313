//! Relational schema for the dive log
//!
//! Integrity lives here: uniqueness of `users.email`, foreign keys from
//! `dives` to users, sites, clubs and instructors, and the time and depth
//! checks on `dives`. Constraint names are fixed so the translator can map
//! a rejection back to its class without parsing messages.

use chrono::{DateTime, Utc};
use divelog_core::{Dive, DiveSite, User};
use sqlx::FromRow;

use crate::translate::ViolationClass;

/// Table names
pub mod tables {
    pub const USERS: &str = "users";
    pub const DIVE_SITES: &str = "dive_sites";
    pub const CLUBS: &str = "clubs";
    pub const INSTRUCTORS: &str = "instructors";
    pub const DIVES: &str = "dives";
}

/// Named constraints declared by [`DDL`]
pub mod constraints {
    pub const USERS_EMAIL_KEY: &str = "users_email_key";
    pub const USERS_FULL_NAME_NOT_BLANK: &str = "users_full_name_not_blank";
    pub const DIVE_SITES_NAME_NOT_BLANK: &str = "dive_sites_name_not_blank";
    pub const DIVES_USER_ID_FKEY: &str = "dives_user_id_fkey";
    pub const DIVES_SITE_ID_FKEY: &str = "dives_site_id_fkey";
    pub const DIVES_CLUB_ID_FKEY: &str = "dives_club_id_fkey";
    pub const DIVES_INSTRUCTOR_ID_FKEY: &str = "dives_instructor_id_fkey";
    pub const DIVES_TIME_RANGE_CHK: &str = "dives_time_range_chk";
    pub const DIVES_DEPTH_NONNEG_CHK: &str = "dives_depth_nonneg_chk";
    pub const DIVES_DEPTH_ORDER_CHK: &str = "dives_depth_order_chk";
}

/// Class of a constraint this schema declares, `None` for unknown names
pub fn constraint_class(name: &str) -> Option<ViolationClass> {
    use constraints::*;

    match name {
        USERS_EMAIL_KEY => Some(ViolationClass::Unique),
        DIVES_USER_ID_FKEY | DIVES_SITE_ID_FKEY | DIVES_CLUB_ID_FKEY | DIVES_INSTRUCTOR_ID_FKEY => {
            Some(ViolationClass::ForeignKey)
        }
        USERS_FULL_NAME_NOT_BLANK
        | DIVE_SITES_NAME_NOT_BLANK
        | DIVES_TIME_RANGE_CHK
        | DIVES_DEPTH_NONNEG_CHK
        | DIVES_DEPTH_ORDER_CHK => Some(ViolationClass::Check),
        _ => None,
    }
}

/// Idempotent DDL, applied in order by [`crate::DbClient::init_schema`]
pub const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
        full_name   TEXT NOT NULL,
        email       TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT users_email_key UNIQUE (email),
        CONSTRAINT users_full_name_not_blank CHECK (btrim(full_name) <> '')
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS dive_sites (
        id          BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
        name        TEXT NOT NULL,
        country     TEXT,
        region      TEXT,
        latitude    NUMERIC(9, 6),
        longitude   NUMERIC(9, 6),
        difficulty  TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT dive_sites_name_not_blank CHECK (btrim(name) <> '')
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clubs (
        id          BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
        name        TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS instructors (
        id          BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
        full_name   TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS dives (
        id             BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
        user_id        BIGINT NOT NULL,
        site_id        BIGINT,
        club_id        BIGINT,
        instructor_id  BIGINT,
        start_time     TIMESTAMPTZ NOT NULL,
        end_time       TIMESTAMPTZ NOT NULL,
        -- unscaled so the depth checks see the value as sent
        max_depth_m    NUMERIC,
        avg_depth_m    NUMERIC,
        water_temp_c   NUMERIC,
        notes          TEXT,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT dives_user_id_fkey FOREIGN KEY (user_id) REFERENCES users (id),
        CONSTRAINT dives_site_id_fkey FOREIGN KEY (site_id) REFERENCES dive_sites (id),
        CONSTRAINT dives_club_id_fkey FOREIGN KEY (club_id) REFERENCES clubs (id),
        CONSTRAINT dives_instructor_id_fkey FOREIGN KEY (instructor_id) REFERENCES instructors (id),
        CONSTRAINT dives_time_range_chk CHECK (end_time > start_time),
        CONSTRAINT dives_depth_nonneg_chk CHECK (
            (max_depth_m IS NULL OR max_depth_m >= 0)
            AND (avg_depth_m IS NULL OR avg_depth_m >= 0)
        ),
        CONSTRAINT dives_depth_order_chk CHECK (
            max_depth_m IS NULL OR avg_depth_m IS NULL OR avg_depth_m <= max_depth_m
        )
    )
    "#,
    "CREATE INDEX IF NOT EXISTS dives_recent_idx ON dives (start_time DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS dives_user_id_idx ON dives (user_id)",
];

/// `users` row
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `dive_sites` row. NUMERIC columns are selected as `float8`.
#[derive(Debug, Clone, FromRow)]
pub struct DiveSiteRow {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub difficulty: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `dives` row. NUMERIC columns are selected as `float8`.
#[derive(Debug, Clone, FromRow)]
pub struct DiveRow {
    pub id: i64,
    pub user_id: i64,
    pub site_id: Option<i64>,
    pub club_id: Option<i64>,
    pub instructor_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_depth_m: Option<f64>,
    pub avg_depth_m: Option<f64>,
    pub water_temp_c: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<DiveSiteRow> for DiveSite {
    fn from(row: DiveSiteRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            country: row.country,
            region: row.region,
            latitude: row.latitude,
            longitude: row.longitude,
            difficulty: row.difficulty,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<DiveRow> for Dive {
    fn from(row: DiveRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            site_id: row.site_id,
            club_id: row.club_id,
            instructor_id: row.instructor_id,
            start_time: row.start_time,
            end_time: row.end_time,
            max_depth_m: row.max_depth_m,
            avg_depth_m: row.avg_depth_m,
            water_temp_c: row.water_temp_c,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
