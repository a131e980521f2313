//! Repository operations for users, dive sites and dives
//!
//! Each create runs one `INSERT ... RETURNING` inside its own transaction,
//! committed before returning. Each list runs one `SELECT` on a pooled
//! connection. Dropping a transaction on an error path rolls it back and
//! returns the connection to the pool.

use crate::schema::{DiveRow, DiveSiteRow, UserRow};
use crate::translate::translate;
use crate::DbClient;
use divelog_core::{
    Dive, DiveLogResult, DiveQuery, DiveRepository, DiveSite, DiveSiteRepository, NewDive,
    NewDiveSite, NewUser, User, UserRepository,
};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres};
use tracing::{debug, instrument};

impl DbClient {
    /// Run a single returning statement as its own unit of work
    async fn write_one<'q, R>(&self, query: QueryAs<'q, Postgres, R, PgArguments>) -> DiveLogResult<R>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut tx = self.pool().begin().await.map_err(translate)?;
        let row = query.fetch_one(&mut *tx).await.map_err(translate)?;
        tx.commit().await.map_err(translate)?;
        Ok(row)
    }
}

#[async_trait::async_trait]
impl UserRepository for DbClient {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &NewUser) -> DiveLogResult<User> {
        let row = self
            .write_one(
                sqlx::query_as::<_, UserRow>(
                    r#"
                    INSERT INTO users (full_name, email)
                    VALUES ($1, $2)
                    RETURNING id, full_name, email, created_at, updated_at
                    "#,
                )
                .bind(user.full_name())
                .bind(user.email()),
            )
            .await?;

        debug!("Inserted user {}", row.id);
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> DiveLogResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, full_name, email, created_at, updated_at
            FROM users
            ORDER BY id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(translate)?;

        debug!("Retrieved {} users", rows.len());
        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[async_trait::async_trait]
impl DiveSiteRepository for DbClient {
    #[instrument(skip(self, site))]
    async fn create_dive_site(&self, site: &NewDiveSite) -> DiveLogResult<DiveSite> {
        let row = self
            .write_one(
                sqlx::query_as::<_, DiveSiteRow>(
                    r#"
                    INSERT INTO dive_sites (name, country, region, latitude, longitude, difficulty)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id, name, country, region,
                              latitude::float8 AS latitude,
                              longitude::float8 AS longitude,
                              difficulty, created_at, updated_at
                    "#,
                )
                .bind(site.name())
                .bind(site.country())
                .bind(site.region())
                .bind(site.latitude())
                .bind(site.longitude())
                .bind(site.difficulty()),
            )
            .await?;

        debug!("Inserted dive site {}", row.id);
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_dive_sites(&self) -> DiveLogResult<Vec<DiveSite>> {
        let rows = sqlx::query_as::<_, DiveSiteRow>(
            r#"
            SELECT id, name, country, region,
                   latitude::float8 AS latitude,
                   longitude::float8 AS longitude,
                   difficulty, created_at, updated_at
            FROM dive_sites
            ORDER BY id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(translate)?;

        debug!("Retrieved {} dive sites", rows.len());
        Ok(rows.into_iter().map(DiveSite::from).collect())
    }
}

#[async_trait::async_trait]
impl DiveRepository for DbClient {
    #[instrument(skip(self, dive), fields(user_id = dive.user_id()))]
    async fn create_dive(&self, dive: &NewDive) -> DiveLogResult<Dive> {
        let row = self
            .write_one(
                sqlx::query_as::<_, DiveRow>(
                    r#"
                    INSERT INTO dives (
                        user_id, site_id, club_id, instructor_id,
                        start_time, end_time,
                        max_depth_m, avg_depth_m, water_temp_c,
                        notes
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    RETURNING id, user_id, site_id, club_id, instructor_id,
                              start_time, end_time,
                              max_depth_m::float8 AS max_depth_m,
                              avg_depth_m::float8 AS avg_depth_m,
                              water_temp_c::float8 AS water_temp_c,
                              notes, created_at, updated_at
                    "#,
                )
                .bind(dive.user_id())
                .bind(dive.site_id())
                .bind(dive.club_id())
                .bind(dive.instructor_id())
                .bind(dive.start_time())
                .bind(dive.end_time())
                .bind(dive.max_depth_m())
                .bind(dive.avg_depth_m())
                .bind(dive.water_temp_c())
                .bind(dive.notes()),
            )
            .await?;

        debug!("Inserted dive {} starting {}", row.id, row.start_time);
        Ok(row.into())
    }

    #[instrument(skip(self), fields(limit = query.limit()))]
    async fn list_dives(&self, query: DiveQuery) -> DiveLogResult<Vec<Dive>> {
        let rows = sqlx::query_as::<_, DiveRow>(
            r#"
            SELECT id, user_id, site_id, club_id, instructor_id,
                   start_time, end_time,
                   max_depth_m::float8 AS max_depth_m,
                   avg_depth_m::float8 AS avg_depth_m,
                   water_temp_c::float8 AS water_temp_c,
                   notes, created_at, updated_at
            FROM dives
            ORDER BY start_time DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(query.limit())
        .fetch_all(self.pool())
        .await
        .map_err(translate)?;

        debug!("Retrieved {} dives", rows.len());
        Ok(rows.into_iter().map(Dive::from).collect())
    }
}
