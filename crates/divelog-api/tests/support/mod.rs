//! In-memory store that enforces the same integrity rules as the
//! PostgreSQL schema, so the HTTP surface can be tested without a server.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use divelog_api::AppState;
use divelog_core::{
    Dive, DiveLogError, DiveLogResult, DiveQuery, DiveRepository, DiveSite, DiveSiteRepository,
    NewDive, NewDiveSite, NewUser, StoreProbe, User, UserRepository,
};
use divelog_db::constraints;
use serde_json::Value;
use tower::ServiceExt;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sites: Vec<DiveSite>,
    dives: Vec<Dive>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    reachable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            reachable: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    pub fn dive_count(&self) -> usize {
        self.tables.lock().unwrap().dives.len()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    fn check_reachable(&self) -> DiveLogResult<()> {
        if self.reachable.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(DiveLogError::Unavailable("connection refused".into()))
        }
    }
}

fn violated(constraint: &str) -> Option<String> {
    Some(constraint.to_string())
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> DiveLogResult<User> {
        self.check_reachable()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(email) = user.email() {
            if tables.users.iter().any(|u| u.email.as_deref() == Some(email)) {
                return Err(DiveLogError::AlreadyExists {
                    constraint: violated(constraints::USERS_EMAIL_KEY),
                });
            }
        }
        let now = Utc::now();
        let stored = User {
            id: tables.next_id(),
            full_name: user.full_name().to_string(),
            email: user.email().map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(stored.clone());
        Ok(stored)
    }

    async fn list_users(&self) -> DiveLogResult<Vec<User>> {
        self.check_reachable()?;
        let mut users = self.tables.lock().unwrap().users.clone();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(users)
    }
}

#[async_trait::async_trait]
impl DiveSiteRepository for MemoryStore {
    async fn create_dive_site(&self, site: &NewDiveSite) -> DiveLogResult<DiveSite> {
        self.check_reachable()?;
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let stored = DiveSite {
            id: tables.next_id(),
            name: site.name().to_string(),
            country: site.country().map(str::to_string),
            region: site.region().map(str::to_string),
            latitude: site.latitude(),
            longitude: site.longitude(),
            difficulty: site.difficulty().map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        tables.sites.push(stored.clone());
        Ok(stored)
    }

    async fn list_dive_sites(&self) -> DiveLogResult<Vec<DiveSite>> {
        self.check_reachable()?;
        let mut sites = self.tables.lock().unwrap().sites.clone();
        sites.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(sites)
    }
}

#[async_trait::async_trait]
impl DiveRepository for MemoryStore {
    async fn create_dive(&self, dive: &NewDive) -> DiveLogResult<Dive> {
        self.check_reachable()?;
        let mut tables = self.tables.lock().unwrap();

        if !tables.users.iter().any(|u| u.id == dive.user_id()) {
            return Err(DiveLogError::InvalidReference {
                constraint: violated(constraints::DIVES_USER_ID_FKEY),
            });
        }
        if let Some(site_id) = dive.site_id() {
            if !tables.sites.iter().any(|s| s.id == site_id) {
                return Err(DiveLogError::InvalidReference {
                    constraint: violated(constraints::DIVES_SITE_ID_FKEY),
                });
            }
        }
        // No clubs or instructors exist in memory
        if dive.club_id().is_some() {
            return Err(DiveLogError::InvalidReference {
                constraint: violated(constraints::DIVES_CLUB_ID_FKEY),
            });
        }
        if dive.instructor_id().is_some() {
            return Err(DiveLogError::InvalidReference {
                constraint: violated(constraints::DIVES_INSTRUCTOR_ID_FKEY),
            });
        }
        if dive.end_time() <= dive.start_time() {
            return Err(DiveLogError::InvalidValues {
                constraint: violated(constraints::DIVES_TIME_RANGE_CHK),
            });
        }
        let negative = |depth: Option<f64>| depth.is_some_and(|d| d < 0.0);
        if negative(dive.max_depth_m()) || negative(dive.avg_depth_m()) {
            return Err(DiveLogError::InvalidValues {
                constraint: violated(constraints::DIVES_DEPTH_NONNEG_CHK),
            });
        }
        if let (Some(max), Some(avg)) = (dive.max_depth_m(), dive.avg_depth_m()) {
            if avg > max {
                return Err(DiveLogError::InvalidValues {
                    constraint: violated(constraints::DIVES_DEPTH_ORDER_CHK),
                });
            }
        }

        let now = Utc::now();
        let stored = Dive {
            id: tables.next_id(),
            user_id: dive.user_id(),
            site_id: dive.site_id(),
            club_id: dive.club_id(),
            instructor_id: dive.instructor_id(),
            start_time: dive.start_time(),
            end_time: dive.end_time(),
            max_depth_m: dive.max_depth_m(),
            avg_depth_m: dive.avg_depth_m(),
            water_temp_c: dive.water_temp_c(),
            notes: dive.notes().map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        tables.dives.push(stored.clone());
        Ok(stored)
    }

    async fn list_dives(&self, query: DiveQuery) -> DiveLogResult<Vec<Dive>> {
        self.check_reachable()?;
        let mut dives = self.tables.lock().unwrap().dives.clone();
        dives.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        dives.truncate(query.limit() as usize);
        Ok(dives)
    }
}

#[async_trait::async_trait]
impl StoreProbe for MemoryStore {
    async fn ping(&self) -> DiveLogResult<()> {
        self.check_reachable()
    }
}

pub fn app() -> (Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let (router, state) = divelog_api::build_app(store.clone()).unwrap();
    (router, state, store)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let res = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(res).await
}

pub async fn post(app: &Router, uri: &str, body: impl Into<String>) -> (StatusCode, Value) {
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.into()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(res).await
}

async fn read(res: axum::response::Response) -> (StatusCode, Value) {
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}
