use std::sync::Arc;

use sqlx::PgConnection;
use uuid::Uuid;

use super::taxon::{ensure, qualitative_problem, quantitative_problem};
use super::ServiceResult;
use crate::database::models::measurement::MeasurementVerify;
use crate::database::models::{
    CritterMeasurements, InvalidEntry, QualitativeMeasurement, QualitativeMeasurementCreate,
    QualitativeMeasurementUpdate, QuantitativeMeasurement, QuantitativeMeasurementCreate,
    QuantitativeMeasurementUpdate, Verification,
};
use crate::database::{by_key, to_columns, Database, Repository};
use crate::itis::{TaxonomyMemo, TaxonomyService};
use crate::validation::Validate;

/// Qualitative (option picked from a list) and quantitative (numeric)
/// measurements share one service; their rules differ only in what is checked
/// against the taxon measurement.
pub struct MeasurementService {
    db: Database,
    taxonomy: Arc<dyn TaxonomyService>,
}

impl MeasurementService {
    pub fn new(db: Database, taxonomy: Arc<dyn TaxonomyService>) -> Self {
        Self { db, taxonomy }
    }

    fn qualitative() -> Repository<QualitativeMeasurement> {
        Repository::new()
    }

    fn quantitative() -> Repository<QuantitativeMeasurement> {
        Repository::new()
    }

    pub async fn list_by_critter(&self, critter_id: Uuid) -> ServiceResult<CritterMeasurements> {
        let mut conn = self.db.pool().acquire().await?;
        Self::for_critter_in(&mut conn, critter_id).await
    }

    pub async fn for_critter_in(conn: &mut PgConnection, critter_id: Uuid) -> ServiceResult<CritterMeasurements> {
        let owned = by_key("critter_id", critter_id);
        let qualitative = Self::qualitative().find_where(&mut *conn, &owned).await?;
        let quantitative = Self::quantitative().find_where(&mut *conn, &owned).await?;
        Ok(CritterMeasurements {
            qualitative,
            quantitative,
        })
    }

    // qualitative

    pub async fn get_qualitative(&self, id: Uuid) -> ServiceResult<QualitativeMeasurement> {
        Ok(Self::qualitative().get(self.db.pool(), id).await?)
    }

    pub async fn create_qualitative(
        &self,
        payload: QualitativeMeasurementCreate,
        user_id: Uuid,
    ) -> ServiceResult<QualitativeMeasurement> {
        let mut conn = self.db.pool().acquire().await?;
        Self::create_qualitative_in(&mut conn, self.taxonomy.as_ref(), payload, user_id).await
    }

    pub async fn update_qualitative(
        &self,
        id: Uuid,
        payload: QualitativeMeasurementUpdate,
        user_id: Uuid,
    ) -> ServiceResult<QualitativeMeasurement> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_qualitative_in(&mut conn, self.taxonomy.as_ref(), id, payload, user_id).await
    }

    pub async fn delete_qualitative(&self, id: Uuid) -> ServiceResult<QualitativeMeasurement> {
        Ok(Self::qualitative().delete(self.db.pool(), id).await?)
    }

    pub async fn create_qualitative_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        payload: QualitativeMeasurementCreate,
        user_id: Uuid,
    ) -> ServiceResult<QualitativeMeasurement> {
        payload.validate()?;
        ensure(
            qualitative_problem(
                &mut *conn,
                taxonomy,
                payload.critter_id,
                payload.taxon_measurement_id,
                payload.qualitative_option_id,
            )
            .await?,
        )?;
        let values = to_columns(&payload)?;
        Ok(Self::qualitative().insert(conn, &values, user_id).await?)
    }

    pub async fn update_qualitative_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        id: Uuid,
        payload: QualitativeMeasurementUpdate,
        user_id: Uuid,
    ) -> ServiceResult<QualitativeMeasurement> {
        payload.validate()?;
        if payload.critter_id.is_some() || payload.taxon_measurement_id.is_some() || payload.qualitative_option_id.is_some()
        {
            let existing = Self::qualitative().get(&mut *conn, id).await?;
            ensure(
                qualitative_problem(
                    &mut *conn,
                    taxonomy,
                    payload.critter_id.unwrap_or(existing.critter_id),
                    payload.taxon_measurement_id.unwrap_or(existing.taxon_measurement_id),
                    payload.qualitative_option_id.unwrap_or(existing.qualitative_option_id),
                )
                .await?,
            )?;
        }
        let values = to_columns(&payload)?;
        Ok(Self::qualitative().update(conn, id, &values, user_id).await?)
    }

    pub async fn delete_qualitative_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<QualitativeMeasurement> {
        Ok(Self::qualitative().delete(conn, id).await?)
    }

    // quantitative

    pub async fn get_quantitative(&self, id: Uuid) -> ServiceResult<QuantitativeMeasurement> {
        Ok(Self::quantitative().get(self.db.pool(), id).await?)
    }

    pub async fn create_quantitative(
        &self,
        payload: QuantitativeMeasurementCreate,
        user_id: Uuid,
    ) -> ServiceResult<QuantitativeMeasurement> {
        let mut conn = self.db.pool().acquire().await?;
        Self::create_quantitative_in(&mut conn, self.taxonomy.as_ref(), payload, user_id).await
    }

    pub async fn update_quantitative(
        &self,
        id: Uuid,
        payload: QuantitativeMeasurementUpdate,
        user_id: Uuid,
    ) -> ServiceResult<QuantitativeMeasurement> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_quantitative_in(&mut conn, self.taxonomy.as_ref(), id, payload, user_id).await
    }

    pub async fn delete_quantitative(&self, id: Uuid) -> ServiceResult<QuantitativeMeasurement> {
        Ok(Self::quantitative().delete(self.db.pool(), id).await?)
    }

    pub async fn create_quantitative_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        payload: QuantitativeMeasurementCreate,
        user_id: Uuid,
    ) -> ServiceResult<QuantitativeMeasurement> {
        payload.validate()?;
        ensure(
            quantitative_problem(
                &mut *conn,
                taxonomy,
                payload.critter_id,
                payload.taxon_measurement_id,
                payload.value,
            )
            .await?,
        )?;
        let values = to_columns(&payload)?;
        Ok(Self::quantitative().insert(conn, &values, user_id).await?)
    }

    pub async fn update_quantitative_in(
        conn: &mut PgConnection,
        taxonomy: &dyn TaxonomyService,
        id: Uuid,
        payload: QuantitativeMeasurementUpdate,
        user_id: Uuid,
    ) -> ServiceResult<QuantitativeMeasurement> {
        payload.validate()?;
        if payload.critter_id.is_some() || payload.taxon_measurement_id.is_some() || payload.value.is_some() {
            let existing = Self::quantitative().get(&mut *conn, id).await?;
            ensure(
                quantitative_problem(
                    &mut *conn,
                    taxonomy,
                    payload.critter_id.unwrap_or(existing.critter_id),
                    payload.taxon_measurement_id.unwrap_or(existing.taxon_measurement_id),
                    payload.value.unwrap_or(existing.value),
                )
                .await?,
            )?;
        }
        let values = to_columns(&payload)?;
        Ok(Self::quantitative().update(conn, id, &values, user_id).await?)
    }

    pub async fn delete_quantitative_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<QuantitativeMeasurement> {
        Ok(Self::quantitative().delete(conn, id).await?)
    }

    /// Check a batch of measurements against their critters' taxa without
    /// writing anything
    pub async fn verify(&self, request: &MeasurementVerify) -> ServiceResult<Verification> {
        let mut conn = self.db.pool().acquire().await?;
        let taxonomy = TaxonomyMemo::new(self.taxonomy.clone());
        let mut invalid = Vec::new();

        for (index, m) in request.qualitative.iter().enumerate() {
            let problem = qualitative_problem(
                &mut conn,
                &taxonomy,
                m.critter_id,
                m.taxon_measurement_id,
                m.qualitative_option_id,
            )
            .await?;
            if let Some(problem) = problem {
                invalid.push(InvalidEntry {
                    kind: Some("qualitative"),
                    index,
                    id: m.measurement_qualitative_id,
                    reason: problem.reason,
                });
            }
        }

        for (index, m) in request.quantitative.iter().enumerate() {
            let problem = quantitative_problem(&mut conn, &taxonomy, m.critter_id, m.taxon_measurement_id, m.value).await?;
            if let Some(problem) = problem {
                invalid.push(InvalidEntry {
                    kind: Some("quantitative"),
                    index,
                    id: m.measurement_quantitative_id,
                    reason: problem.reason,
                });
            }
        }

        Ok(Verification::from_invalid(invalid))
    }
}
