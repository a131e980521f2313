use crate::error::DiveLogResult;
use crate::types::{Dive, DiveQuery, DiveSite, NewDive, NewDiveSite, NewUser, User};

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert one user and return it as stored
    async fn create_user(&self, user: &NewUser) -> DiveLogResult<User>;

    /// All users, newest id first
    async fn list_users(&self) -> DiveLogResult<Vec<User>>;
}

#[async_trait::async_trait]
pub trait DiveSiteRepository: Send + Sync {
    async fn create_dive_site(&self, site: &NewDiveSite) -> DiveLogResult<DiveSite>;

    /// All dive sites, newest id first
    async fn list_dive_sites(&self) -> DiveLogResult<Vec<DiveSite>>;
}

#[async_trait::async_trait]
pub trait DiveRepository: Send + Sync {
    async fn create_dive(&self, dive: &NewDive) -> DiveLogResult<Dive>;

    /// Up to `query.limit()` dives, latest start first, ties by id descending
    async fn list_dives(&self, query: DiveQuery) -> DiveLogResult<Vec<Dive>>;
}

#[async_trait::async_trait]
pub trait StoreProbe: Send + Sync {
    /// Cheap round-trip proving the store is reachable
    async fn ping(&self) -> DiveLogResult<()>;
}

/// Everything the request surface needs from a backing store
pub trait DiveStore: UserRepository + DiveSiteRepository + DiveRepository + StoreProbe {}

impl<T> DiveStore for T where T: UserRepository + DiveSiteRepository + DiveRepository + StoreProbe {}
