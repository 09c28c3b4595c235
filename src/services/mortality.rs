use std::sync::Arc;

use sqlx::PgConnection;
use uuid::Uuid;

use super::taxon::ensure_tsn;
use super::{LocationService, ServiceResult};
use crate::database::models::{Location, Mortality, MortalityCreate, MortalityDetailed, MortalityUpdate};
use crate::database::{by_key, to_columns, Database, Repository};
use crate::itis::TaxonomyService;
use crate::validation::Validate;

pub struct MortalityService {
    db: Database,
    taxonomy: Arc<dyn TaxonomyService>,
}

impl MortalityService {
    pub fn new(db: Database, taxonomy: Arc<dyn TaxonomyService>) -> Self {
        Self { db, taxonomy }
    }

    fn repo() -> Repository<Mortality> {
        Repository::new()
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<MortalityDetailed> {
        let mut conn = self.db.pool().acquire().await?;
        let mortality = Self::repo().get(&mut *conn, id).await?;
        Self::detailed(&mut conn, mortality).await
    }

    pub async fn list_by_critter(&self, critter_id: Uuid) -> ServiceResult<Vec<MortalityDetailed>> {
        let mut conn = self.db.pool().acquire().await?;
        let mortalities = Self::repo()
            .find_where_ordered(&mut *conn, &by_key("critter_id", critter_id), "mortality_timestamp")
            .await?;
        let ids: Vec<Uuid> = mortalities.iter().filter_map(|m| m.location_id).collect();
        let locations = LocationService::find_many(&mut conn, &ids).await?;
        Ok(mortalities
            .into_iter()
            .map(|mortality| MortalityDetailed {
                location: mortality
                    .location_id
                    .and_then(|id| locations.iter().find(|l| l.location_id == id).cloned()),
                mortality,
            })
            .collect())
    }

    pub async fn create(&self, payload: MortalityCreate, user_id: Uuid) -> ServiceResult<MortalityDetailed> {
        let mut tx = self.db.begin().await?;
        let mortality = Self::create_in(&mut tx, self.taxonomy.as_ref(), payload, user_id).await?;
        let detailed = Self::detailed(&mut tx, mortality).await?;
        tx.commit().await?;
        Ok(detailed)
    }

    pub async fn update(&self, id: Uuid, payload: MortalityUpdate, user_id: Uuid) -> ServiceResult<MortalityDetailed> {
        let mut tx = self.db.begin().await?;
        let mortality = Self::update_in(&mut tx, self.taxonomy.as_ref(), id, payload, user_id).await?;
        let detailed = Self::detailed(&mut tx, mortality).await?;
        tx.commit().await?;
        Ok(detailed)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<Mortality> {
        let mut tx = self.db.begin().await?;
        let mortality = Self::delete_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(mortality)
    }

    pub async fn create_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        mut payload: MortalityCreate,
        user_id: Uuid,
    ) -> ServiceResult<Mortality> {
        payload.validate()?;
        check_predators(taxonomy, payload.proximate_predated_by_itis_tsn, payload.ultimate_predated_by_itis_tsn).await?;
        if let Some(location) = payload.location.take() {
            let location = LocationService::create_in(&mut *conn, location, user_id).await?;
            payload.location_id = Some(location.location_id);
        }
        let values = to_columns(&payload)?;
        Ok(Self::repo().insert(conn, &values, user_id).await?)
    }

    /// A nested `location` updates the mortality's location, or creates one
    pub async fn update_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        id: Uuid,
        mut payload: MortalityUpdate,
        user_id: Uuid,
    ) -> ServiceResult<Mortality> {
        payload.validate()?;
        check_predators(taxonomy, payload.proximate_predated_by_itis_tsn, payload.ultimate_predated_by_itis_tsn).await?;
        let existing = Self::repo().get(&mut *conn, id).await?;

        if let Some(location) = payload.location.take() {
            match existing.location_id {
                Some(location_id) => {
                    LocationService::update_in(&mut *conn, location_id, location, user_id).await?;
                }
                None => {
                    let created = LocationService::create_in(&mut *conn, location.into(), user_id).await?;
                    payload.location_id = Some(created.location_id);
                }
            }
        }

        if !payload.has_columns() {
            return Ok(existing);
        }
        let values = to_columns(&payload)?;
        Ok(Self::repo().update(conn, id, &values, user_id).await?)
    }

    pub async fn delete_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<Mortality> {
        let mortality = Self::repo().delete(&mut *conn, id).await?;
        LocationService::delete_owned(conn, &[mortality.location_id]).await?;
        Ok(mortality)
    }

    async fn detailed(conn: &mut PgConnection, mortality: Mortality) -> ServiceResult<MortalityDetailed> {
        let location = match mortality.location_id {
            Some(id) => Repository::<Location>::new().find_by_id(conn, id).await?,
            None => None,
        };
        Ok(MortalityDetailed { mortality, location })
    }
}

async fn check_predators(
    taxonomy: &dyn TaxonomyService,
    proximate: Option<i32>,
    ultimate: Option<i32>,
) -> ServiceResult<()> {
    if let Some(tsn) = proximate {
        ensure_tsn(taxonomy, tsn, "proximate_predated_by_itis_tsn").await?;
    }
    if let Some(tsn) = ultimate {
        ensure_tsn(taxonomy, tsn, "ultimate_predated_by_itis_tsn").await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itis::StaticTaxonomy;
    use crate::services::ServiceError;

    #[tokio::test]
    async fn unknown_predator_names_its_field() {
        let taxonomy = StaticTaxonomy::new().with_taxon(180596, "Canis lupus", &[180596]);
        assert!(check_predators(&taxonomy, Some(180596), None).await.is_ok());
        match check_predators(&taxonomy, Some(180596), Some(7)).await {
            Err(ServiceError::Validation(err)) => {
                assert!(err.field_errors.contains_key("ultimate_predated_by_itis_tsn"));
                assert!(!err.field_errors.contains_key("proximate_predated_by_itis_tsn"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
