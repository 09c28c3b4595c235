use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::ServiceResult;
use crate::database::models::xref::{
    CollectionCategoryForTaxon, CollectionUnit, QualitativeMeasurementWithOptions, QualitativeOption,
    TaxonMarkingBodyLocation, TaxonMeasurements, TaxonQualitativeMeasurement, TaxonQuantitativeMeasurement,
};
use crate::database::query::{self, json_rows};
use crate::database::{by_key, by_keys, Database, Repository};
use crate::filter::{SqlResult, SqlValue};
use crate::itis::TaxonomyService;

/// Taxonomy cross-references for a TSN. A row defined for any ancestor of the
/// TSN applies to it, so every query matches on the whole hierarchy.
pub struct XrefService {
    db: Database,
    taxonomy: Arc<dyn TaxonomyService>,
}

impl XrefService {
    pub fn new(db: Database, taxonomy: Arc<dyn TaxonomyService>) -> Self {
        Self { db, taxonomy }
    }

    /// Unknown TSNs surface as ITIS not-found errors
    async fn hierarchy(&self, tsn: i32) -> ServiceResult<Vec<i32>> {
        Ok(self.taxonomy.tsn_hierarchy(tsn).await?)
    }

    pub async fn collection_categories(&self, tsn: i32) -> ServiceResult<Vec<CollectionCategoryForTaxon>> {
        let hierarchy = self.hierarchy(tsn).await?;
        let sql = SqlResult {
            query: json_rows(
                "SELECT c.\"collection_category_id\", c.\"category_name\", c.\"description\", x.\"itis_tsn\" \
                 FROM \"xref_taxon_collection_category\" x \
                 JOIN \"lk_collection_category\" c ON c.\"collection_category_id\" = x.\"collection_category_id\" \
                 WHERE x.\"itis_tsn\" = ANY($1::integer[]) \
                 ORDER BY c.\"category_name\"",
            ),
            params: vec![SqlValue::IntArray(hierarchy.into_iter().map(i64::from).collect())],
        };
        Ok(query::fetch_all(self.db.pool(), &sql).await?)
    }

    pub async fn collection_units(&self, category_id: Uuid) -> ServiceResult<Vec<CollectionUnit>> {
        Ok(Repository::<CollectionUnit>::new()
            .find_where_ordered(self.db.pool(), &by_key("collection_category_id", category_id), "unit_name")
            .await?)
    }

    pub async fn marking_body_locations(&self, tsn: i32) -> ServiceResult<Vec<TaxonMarkingBodyLocation>> {
        let hierarchy = self.hierarchy(tsn).await?;
        Ok(Repository::<TaxonMarkingBodyLocation>::new()
            .find_where_ordered(self.db.pool(), &json!({ "itis_tsn": { "$in": hierarchy } }), "body_location")
            .await?)
    }

    pub async fn qualitative_measurements(&self, tsn: i32) -> ServiceResult<Vec<QualitativeMeasurementWithOptions>> {
        let hierarchy = self.hierarchy(tsn).await?;
        self.qualitative_for(&hierarchy).await
    }

    pub async fn qualitative_options(&self, taxon_measurement_id: Uuid) -> ServiceResult<Vec<QualitativeOption>> {
        Ok(Repository::<QualitativeOption>::new()
            .find_where_ordered(
                self.db.pool(),
                &by_key("taxon_measurement_id", taxon_measurement_id),
                "option_value",
            )
            .await?)
    }

    pub async fn quantitative_measurements(&self, tsn: i32) -> ServiceResult<Vec<TaxonQuantitativeMeasurement>> {
        let hierarchy = self.hierarchy(tsn).await?;
        self.quantitative_for(&hierarchy).await
    }

    pub async fn measurements(&self, tsn: i32) -> ServiceResult<TaxonMeasurements> {
        let hierarchy = self.hierarchy(tsn).await?;
        Ok(TaxonMeasurements {
            qualitative: self.qualitative_for(&hierarchy).await?,
            quantitative: self.quantitative_for(&hierarchy).await?,
        })
    }

    async fn qualitative_for(&self, hierarchy: &[i32]) -> ServiceResult<Vec<QualitativeMeasurementWithOptions>> {
        let measurements = Repository::<TaxonQualitativeMeasurement>::new()
            .find_where_ordered(
                self.db.pool(),
                &json!({ "itis_tsn": { "$in": hierarchy } }),
                "measurement_name",
            )
            .await?;
        if measurements.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = measurements.iter().map(|m| m.taxon_measurement_id).collect();
        let options = Repository::<QualitativeOption>::new()
            .find_where_ordered(self.db.pool(), &by_keys("taxon_measurement_id", &ids), "option_value")
            .await?;

        Ok(measurements
            .into_iter()
            .map(|measurement| QualitativeMeasurementWithOptions {
                options: options
                    .iter()
                    .filter(|o| o.taxon_measurement_id == measurement.taxon_measurement_id)
                    .cloned()
                    .collect(),
                measurement,
            })
            .collect())
    }

    async fn quantitative_for(&self, hierarchy: &[i32]) -> ServiceResult<Vec<TaxonQuantitativeMeasurement>> {
        Ok(Repository::<TaxonQuantitativeMeasurement>::new()
            .find_where_ordered(
                self.db.pool(),
                &json!({ "itis_tsn": { "$in": hierarchy } }),
                "measurement_name",
            )
            .await?)
    }
}
