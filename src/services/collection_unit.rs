use std::sync::Arc;

use sqlx::PgConnection;
use uuid::Uuid;

use super::taxon::{collection_unit_problem, ensure};
use super::ServiceResult;
use crate::database::models::{CritterCollectionUnit, CritterCollectionUnitCreate, CritterCollectionUnitUpdate};
use crate::database::{by_key, to_columns, Database, Repository};
use crate::itis::TaxonomyService;
use crate::validation::Validate;

/// Assignment of critters to collection units (herds, population units)
pub struct CollectionUnitService {
    db: Database,
    taxonomy: Arc<dyn TaxonomyService>,
}

impl CollectionUnitService {
    pub fn new(db: Database, taxonomy: Arc<dyn TaxonomyService>) -> Self {
        Self { db, taxonomy }
    }

    fn repo() -> Repository<CritterCollectionUnit> {
        Repository::new()
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<CritterCollectionUnit> {
        Ok(Self::repo().get(self.db.pool(), id).await?)
    }

    pub async fn list_by_critter(&self, critter_id: Uuid) -> ServiceResult<Vec<CritterCollectionUnit>> {
        Ok(Self::repo()
            .find_where(self.db.pool(), &by_key("critter_id", critter_id))
            .await?)
    }

    pub async fn create(
        &self,
        payload: CritterCollectionUnitCreate,
        user_id: Uuid,
    ) -> ServiceResult<CritterCollectionUnit> {
        let mut conn = self.db.pool().acquire().await?;
        Self::create_in(&mut conn, self.taxonomy.as_ref(), payload, user_id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: CritterCollectionUnitUpdate,
        user_id: Uuid,
    ) -> ServiceResult<CritterCollectionUnit> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_in(&mut conn, self.taxonomy.as_ref(), id, payload, user_id).await
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<CritterCollectionUnit> {
        Ok(Self::repo().delete(self.db.pool(), id).await?)
    }

    pub async fn create_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        payload: CritterCollectionUnitCreate,
        user_id: Uuid,
    ) -> ServiceResult<CritterCollectionUnit> {
        payload.validate()?;
        ensure(collection_unit_problem(&mut *conn, taxonomy, payload.critter_id, payload.collection_unit_id).await?)?;
        let values = to_columns(&payload)?;
        Ok(Self::repo().insert(conn, &values, user_id).await?)
    }

    pub async fn update_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        id: Uuid,
        payload: CritterCollectionUnitUpdate,
        user_id: Uuid,
    ) -> ServiceResult<CritterCollectionUnit> {
        payload.validate()?;
        if payload.critter_id.is_some() || payload.collection_unit_id.is_some() {
            let existing = Self::repo().get(&mut *conn, id).await?;
            let critter_id = payload.critter_id.unwrap_or(existing.critter_id);
            let unit_id = payload.collection_unit_id.unwrap_or(existing.collection_unit_id);
            ensure(collection_unit_problem(&mut *conn, taxonomy, critter_id, unit_id).await?)?;
        }
        let values = to_columns(&payload)?;
        Ok(Self::repo().update(conn, id, &values, user_id).await?)
    }

    pub async fn delete_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<CritterCollectionUnit> {
        Ok(Self::repo().delete(conn, id).await?)
    }
}
