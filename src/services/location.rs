use sqlx::PgConnection;
use uuid::Uuid;

use super::ServiceResult;
use crate::database::models::{Location, LocationCreate, LocationUpdate};
use crate::database::{by_key, by_keys, to_columns, Database, Repository};
use crate::validation::Validate;

pub struct LocationService {
    db: Database,
}

impl LocationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn repo() -> Repository<Location> {
        Repository::new()
    }

    pub async fn list(&self) -> ServiceResult<Vec<Location>> {
        Ok(Self::repo().find_all(self.db.pool()).await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Location> {
        Ok(Self::repo().get(self.db.pool(), id).await?)
    }

    pub async fn create(&self, payload: LocationCreate, user_id: Uuid) -> ServiceResult<Location> {
        let mut conn = self.db.pool().acquire().await?;
        Self::create_in(&mut *conn, payload, user_id).await
    }

    pub async fn update(&self, id: Uuid, payload: LocationUpdate, user_id: Uuid) -> ServiceResult<Location> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_in(&mut *conn, id, payload, user_id).await
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<Location> {
        Ok(Self::repo().delete(self.db.pool(), id).await?)
    }

    pub async fn create_in(conn: &mut PgConnection, payload: LocationCreate, user_id: Uuid) -> ServiceResult<Location> {
        payload.validate()?;
        let values = to_columns(&payload.with_default_unit())?;
        Ok(Self::repo().insert(conn, &values, user_id).await?)
    }

    pub async fn update_in(
        conn: &mut PgConnection,
        id: Uuid,
        payload: LocationUpdate,
        user_id: Uuid,
    ) -> ServiceResult<Location> {
        payload.validate()?;
        let values = to_columns(&payload)?;
        Ok(Self::repo().update(conn, id, &values, user_id).await?)
    }

    pub async fn delete_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<Location> {
        Ok(Self::repo().delete(conn, id).await?)
    }

    /// Fetch several locations at once, skipping absent ids
    pub async fn find_many(conn: &mut PgConnection, ids: &[Uuid]) -> ServiceResult<Vec<Location>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Self::repo().find_where(conn, &by_keys("location_id", ids)).await?)
    }

    /// Remove locations owned by a deleted event
    pub async fn delete_owned(conn: &mut PgConnection, ids: &[Option<Uuid>]) -> ServiceResult<usize> {
        let mut removed = 0;
        for id in ids.iter().flatten() {
            removed += Self::repo().delete_where(&mut *conn, &by_key("location_id", *id)).await?.len();
        }
        Ok(removed)
    }
}
