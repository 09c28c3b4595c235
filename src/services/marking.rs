use std::sync::Arc;

use sqlx::PgConnection;
use uuid::Uuid;

use super::taxon::{ensure, marking_problem};
use super::ServiceResult;
use crate::database::models::marking::MarkingVerify;
use crate::database::models::{InvalidEntry, Marking, MarkingCreate, MarkingUpdate, Verification};
use crate::database::{by_key, to_columns, Database, Repository};
use crate::itis::{TaxonomyMemo, TaxonomyService};
use crate::validation::{FieldErrors, Validate};

pub struct MarkingService {
    db: Database,
    taxonomy: Arc<dyn TaxonomyService>,
}

impl MarkingService {
    pub fn new(db: Database, taxonomy: Arc<dyn TaxonomyService>) -> Self {
        Self { db, taxonomy }
    }

    fn repo() -> Repository<Marking> {
        Repository::new()
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Marking> {
        Ok(Self::repo().get(self.db.pool(), id).await?)
    }

    pub async fn list_by_critter(&self, critter_id: Uuid) -> ServiceResult<Vec<Marking>> {
        Ok(Self::repo()
            .find_where_ordered(self.db.pool(), &by_key("critter_id", critter_id), "attached_timestamp")
            .await?)
    }

    pub async fn create(&self, payload: MarkingCreate, user_id: Uuid) -> ServiceResult<Marking> {
        let mut conn = self.db.pool().acquire().await?;
        Self::create_in(&mut conn, self.taxonomy.as_ref(), payload, user_id).await
    }

    pub async fn update(&self, id: Uuid, payload: MarkingUpdate, user_id: Uuid) -> ServiceResult<Marking> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_in(&mut conn, self.taxonomy.as_ref(), id, payload, user_id).await
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<Marking> {
        Ok(Self::repo().delete(self.db.pool(), id).await?)
    }

    pub async fn create_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        payload: MarkingCreate,
        user_id: Uuid,
    ) -> ServiceResult<Marking> {
        payload.validate()?;
        ensure(marking_problem(&mut *conn, taxonomy, payload.critter_id, payload.taxon_marking_body_location_id).await?)?;
        let values = to_columns(&payload)?;
        Ok(Self::repo().insert(conn, &values, user_id).await?)
    }

    /// The body location is re-checked when the critter or location changes
    pub async fn update_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        id: Uuid,
        payload: MarkingUpdate,
        user_id: Uuid,
    ) -> ServiceResult<Marking> {
        payload.validate()?;
        let existing = Self::repo().get(&mut *conn, id).await?;

        let mut errors = FieldErrors::new();
        errors.chronological(
            "removed_timestamp",
            Some(payload.attached_timestamp.as_ref().unwrap_or(&existing.attached_timestamp)),
            payload.removed_timestamp.as_ref().or(existing.removed_timestamp.as_ref()),
            "attached_timestamp",
        );
        errors.finish()?;

        if payload.critter_id.is_some() || payload.taxon_marking_body_location_id.is_some() {
            let critter_id = payload.critter_id.unwrap_or(existing.critter_id);
            let body_location_id = payload
                .taxon_marking_body_location_id
                .unwrap_or(existing.taxon_marking_body_location_id);
            ensure(marking_problem(&mut *conn, taxonomy, critter_id, body_location_id).await?)?;
        }

        let values = to_columns(&payload)?;
        Ok(Self::repo().update(conn, id, &values, user_id).await?)
    }

    pub async fn delete_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<Marking> {
        Ok(Self::repo().delete(conn, id).await?)
    }

    /// Report every marking whose body location does not fit its critter
    pub async fn verify(&self, request: &MarkingVerify) -> ServiceResult<Verification> {
        let mut conn = self.db.pool().acquire().await?;
        let taxonomy = TaxonomyMemo::new(self.taxonomy.clone());
        let mut invalid = Vec::new();
        for (index, entry) in request.markings.iter().enumerate() {
            let problem = marking_problem(
                &mut conn,
                &taxonomy,
                entry.critter_id,
                entry.taxon_marking_body_location_id,
            )
            .await?;
            if let Some(problem) = problem {
                invalid.push(InvalidEntry {
                    kind: None,
                    index,
                    id: entry.marking_id,
                    reason: problem.reason,
                });
            }
        }
        Ok(Verification::from_invalid(invalid))
    }
}
