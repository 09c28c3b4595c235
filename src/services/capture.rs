use sqlx::PgConnection;
use uuid::Uuid;

use super::{LocationService, ServiceResult};
use crate::database::models::{Capture, CaptureCreate, CaptureDetailed, CaptureUpdate, Location};
use crate::database::{by_key, to_columns, Database, Repository};
use crate::validation::{FieldErrors, Validate};

pub struct CaptureService {
    db: Database,
}

impl CaptureService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn repo() -> Repository<Capture> {
        Repository::new()
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<CaptureDetailed> {
        let mut conn = self.db.pool().acquire().await?;
        let capture = Self::repo().get(&mut *conn, id).await?;
        Self::detailed(&mut conn, capture).await
    }

    pub async fn list_by_critter(&self, critter_id: Uuid) -> ServiceResult<Vec<CaptureDetailed>> {
        let mut conn = self.db.pool().acquire().await?;
        Self::detailed_for_critter(&mut conn, critter_id).await
    }

    pub async fn create(&self, payload: CaptureCreate, user_id: Uuid) -> ServiceResult<CaptureDetailed> {
        let mut tx = self.db.begin().await?;
        let capture = Self::create_in(&mut tx, payload, user_id).await?;
        let detailed = Self::detailed(&mut tx, capture).await?;
        tx.commit().await?;
        Ok(detailed)
    }

    pub async fn update(&self, id: Uuid, payload: CaptureUpdate, user_id: Uuid) -> ServiceResult<CaptureDetailed> {
        let mut tx = self.db.begin().await?;
        let capture = Self::update_in(&mut tx, id, payload, user_id).await?;
        let detailed = Self::detailed(&mut tx, capture).await?;
        tx.commit().await?;
        Ok(detailed)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<Capture> {
        let mut tx = self.db.begin().await?;
        let capture = Self::delete_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(capture)
    }

    pub async fn detailed_for_critter(conn: &mut PgConnection, critter_id: Uuid) -> ServiceResult<Vec<CaptureDetailed>> {
        let captures = Self::repo()
            .find_where_ordered(&mut *conn, &by_key("critter_id", critter_id), "capture_timestamp")
            .await?;
        Self::with_locations(conn, captures).await
    }

    /// Nested `capture_location` / `release_location` are inserted first and
    /// linked by id
    pub async fn create_in(conn: &mut PgConnection, mut payload: CaptureCreate, user_id: Uuid) -> ServiceResult<Capture> {
        payload.validate()?;
        if let Some(location) = payload.capture_location.take() {
            let location = LocationService::create_in(&mut *conn, location, user_id).await?;
            payload.capture_location_id = Some(location.location_id);
        }
        if let Some(location) = payload.release_location.take() {
            let location = LocationService::create_in(&mut *conn, location, user_id).await?;
            payload.release_location_id = Some(location.location_id);
        }
        let values = to_columns(&payload)?;
        Ok(Self::repo().insert(conn, &values, user_id).await?)
    }

    /// Nested locations update the capture's existing location rows, or
    /// create them when the capture has none
    pub async fn update_in(
        conn: &mut PgConnection,
        id: Uuid,
        mut payload: CaptureUpdate,
        user_id: Uuid,
    ) -> ServiceResult<Capture> {
        payload.validate()?;
        let existing = Self::repo().get(&mut *conn, id).await?;

        let mut errors = FieldErrors::new();
        errors.chronological(
            "release_timestamp",
            Some(payload.capture_timestamp.as_ref().unwrap_or(&existing.capture_timestamp)),
            payload.release_timestamp.as_ref().or(existing.release_timestamp.as_ref()),
            "capture_timestamp",
        );
        errors.finish()?;

        if let Some(location) = payload.capture_location.take() {
            match existing.capture_location_id {
                Some(location_id) => {
                    LocationService::update_in(&mut *conn, location_id, location, user_id).await?;
                }
                None => {
                    let created = LocationService::create_in(&mut *conn, location.into(), user_id).await?;
                    payload.capture_location_id = Some(created.location_id);
                }
            }
        }
        if let Some(location) = payload.release_location.take() {
            match existing.release_location_id {
                Some(location_id) => {
                    LocationService::update_in(&mut *conn, location_id, location, user_id).await?;
                }
                None => {
                    let created = LocationService::create_in(&mut *conn, location.into(), user_id).await?;
                    payload.release_location_id = Some(created.location_id);
                }
            }
        }

        if !payload.has_columns() {
            return Ok(existing);
        }
        let values = to_columns(&payload)?;
        Ok(Self::repo().update(conn, id, &values, user_id).await?)
    }

    /// Deleting a capture removes its locations as well
    pub async fn delete_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<Capture> {
        let capture = Self::repo().delete(&mut *conn, id).await?;
        LocationService::delete_owned(conn, &[capture.capture_location_id, capture.release_location_id]).await?;
        Ok(capture)
    }

    async fn detailed(conn: &mut PgConnection, capture: Capture) -> ServiceResult<CaptureDetailed> {
        let repo = Repository::<Location>::new();
        let capture_location = match capture.capture_location_id {
            Some(id) => repo.find_by_id(&mut *conn, id).await?,
            None => None,
        };
        let release_location = match capture.release_location_id {
            Some(id) => repo.find_by_id(&mut *conn, id).await?,
            None => None,
        };
        Ok(CaptureDetailed {
            capture,
            capture_location,
            release_location,
        })
    }

    async fn with_locations(conn: &mut PgConnection, captures: Vec<Capture>) -> ServiceResult<Vec<CaptureDetailed>> {
        let ids: Vec<Uuid> = captures
            .iter()
            .flat_map(|c| [c.capture_location_id, c.release_location_id])
            .flatten()
            .collect();
        let locations = LocationService::find_many(conn, &ids).await?;
        let find = |id: Option<Uuid>| id.and_then(|id| locations.iter().find(|l| l.location_id == id).cloned());

        Ok(captures
            .into_iter()
            .map(|capture| CaptureDetailed {
                capture_location: find(capture.capture_location_id),
                release_location: find(capture.release_location_id),
                capture,
            })
            .collect())
    }
}
