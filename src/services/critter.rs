use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use super::taxon::ensure_tsn;
use super::{CaptureService, LocationService, MeasurementService, ServiceResult};
use crate::database::models::{
    Capture, Critter, CritterCollectionUnit, CritterCreate, CritterDetailed, CritterFilter, CritterSimilar, CritterUpdate,
    FamilyChild, FamilyParent, Marking, Mortality, MortalityDetailed,
};
use crate::database::{by_key, by_keys, to_columns, Database, Repository};
use crate::itis::TaxonomyService;
use crate::validation::Validate;

pub struct CritterService {
    db: Database,
    taxonomy: Arc<dyn TaxonomyService>,
}

impl CritterService {
    pub fn new(db: Database, taxonomy: Arc<dyn TaxonomyService>) -> Self {
        Self { db, taxonomy }
    }

    fn repo() -> Repository<Critter> {
        Repository::new()
    }

    /// All critters, or those with the given wildlife health id
    pub async fn list(&self, wlh_id: Option<&str>) -> ServiceResult<Vec<Critter>> {
        let filter = match wlh_id {
            Some(wlh_id) => json!({ "wlh_id": wlh_id }),
            None => Value::Null,
        };
        Ok(Self::repo().find_where(self.db.pool(), &filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Critter> {
        Ok(Self::repo().get(self.db.pool(), id).await?)
    }

    /// A critter with every event and observation attached to it
    pub async fn get_detailed(&self, id: Uuid) -> ServiceResult<CritterDetailed> {
        let mut conn = self.db.pool().acquire().await?;
        let critter = Self::repo().get(&mut *conn, id).await?;
        let owned = by_key("critter_id", id);

        let captures = CaptureService::detailed_for_critter(&mut conn, id).await?;

        let mortalities: Vec<Mortality> = Repository::<Mortality>::new()
            .find_where_ordered(&mut *conn, &owned, "mortality_timestamp")
            .await?;
        let location_ids: Vec<Uuid> = mortalities.iter().filter_map(|m| m.location_id).collect();
        let locations = LocationService::find_many(&mut conn, &location_ids).await?;
        let mortality = mortalities
            .into_iter()
            .map(|m| MortalityDetailed {
                location: m
                    .location_id
                    .and_then(|lid| locations.iter().find(|l| l.location_id == lid).cloned()),
                mortality: m,
            })
            .collect();

        let markings = Repository::<Marking>::new()
            .find_where_ordered(&mut *conn, &owned, "attached_timestamp")
            .await?;
        let measurements = MeasurementService::for_critter_in(&mut conn, id).await?;
        let collection_units = Repository::<CritterCollectionUnit>::new()
            .find_where(&mut *conn, &owned)
            .await?;
        let family_parent = Repository::<FamilyParent>::new()
            .find_where(&mut *conn, &by_key("parent_critter_id", id))
            .await?;
        let family_child = Repository::<FamilyChild>::new()
            .find_where(&mut *conn, &by_key("child_critter_id", id))
            .await?;

        Ok(CritterDetailed {
            critter,
            captures,
            mortality,
            markings,
            measurements,
            collection_units,
            family_parent,
            family_child,
        })
    }

    pub async fn filter(&self, filter: &CritterFilter) -> ServiceResult<Vec<Critter>> {
        Ok(Self::repo().find_where(self.db.pool(), &filter.to_where()).await?)
    }

    pub async fn create(&self, payload: CritterCreate, user_id: Uuid) -> ServiceResult<Critter> {
        let mut conn = self.db.pool().acquire().await?;
        Self::create_in(&mut conn, self.taxonomy.as_ref(), payload, user_id).await
    }

    pub async fn update(&self, id: Uuid, payload: CritterUpdate, user_id: Uuid) -> ServiceResult<Critter> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_in(&mut conn, self.taxonomy.as_ref(), id, payload, user_id).await
    }

    /// Events, markings and measurements cascade with the critter
    pub async fn delete(&self, id: Uuid) -> ServiceResult<Critter> {
        let mut tx = self.db.begin().await?;
        let critter = Self::delete_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(critter)
    }

    pub async fn create_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        mut payload: CritterCreate,
        user_id: Uuid,
    ) -> ServiceResult<Critter> {
        payload.validate()?;
        if payload.itis_scientific_name.is_none() {
            payload.itis_scientific_name = Some(ensure_tsn(taxonomy, payload.itis_tsn, "itis_tsn").await?);
        }
        let values = to_columns(&payload)?;
        let critter = Self::repo().insert(conn, &values, user_id).await?;
        debug!("Created critter {} ({})", critter.critter_id, critter.itis_scientific_name);
        Ok(critter)
    }

    /// A new `itis_tsn` without a name re-resolves the scientific name
    pub async fn update_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        id: Uuid,
        mut payload: CritterUpdate,
        user_id: Uuid,
    ) -> ServiceResult<Critter> {
        payload.validate()?;
        if let (Some(tsn), None) = (payload.itis_tsn, payload.itis_scientific_name.as_ref()) {
            payload.itis_scientific_name = Some(ensure_tsn(taxonomy, tsn, "itis_tsn").await?);
        }
        let values = to_columns(&payload)?;
        Ok(Self::repo().update(conn, id, &values, user_id).await?)
    }

    /// Capture and mortality locations are owned by their events, so they go too
    pub async fn delete_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<Critter> {
        let owned = by_key("critter_id", id);
        let captures = Repository::<Capture>::new()
            .find_where(&mut *conn, &owned)
            .await?;
        let mortalities = Repository::<Mortality>::new().find_where(&mut *conn, &owned).await?;

        let critter = Self::repo().delete(&mut *conn, id).await?;

        let mut locations: Vec<Option<Uuid>> = Vec::new();
        for capture in &captures {
            locations.push(capture.capture_location_id);
            locations.push(capture.release_location_id);
        }
        locations.extend(mortalities.iter().map(|m| m.location_id));
        LocationService::delete_owned(conn, &locations).await?;
        Ok(critter)
    }

    /// Critters that may be the same animal: same wildlife health id, same
    /// animal id and taxon, or carrying a marking with the same identifier
    pub async fn similar(&self, request: &CritterSimilar) -> ServiceResult<Vec<Critter>> {
        let mut conditions = Vec::new();
        if let Some(wlh_id) = &request.critter.wlh_id {
            conditions.push(json!({ "wlh_id": wlh_id }));
        }
        if let (Some(animal_id), Some(tsn)) = (&request.critter.animal_id, request.critter.itis_tsn) {
            conditions.push(json!({ "animal_id": animal_id, "itis_tsn": tsn }));
        }

        let identifiers: Vec<&str> = request
            .markings
            .iter()
            .filter_map(|m| m.identifier.as_deref())
            .filter(|i| !i.trim().is_empty())
            .collect();
        if !identifiers.is_empty() {
            let markings = Repository::<Marking>::new()
                .find_where(self.db.pool(), &json!({ "identifier": { "$in": identifiers } }))
                .await?;
            let ids: HashSet<Uuid> = markings.iter().map(|m| m.critter_id).collect();
            if !ids.is_empty() {
                let ids: Vec<Uuid> = ids.into_iter().collect();
                conditions.push(by_keys("critter_id", &ids));
            }
        }

        if conditions.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Self::repo()
            .find_where(self.db.pool(), &json!({ "$or": conditions }))
            .await?)
    }
}
