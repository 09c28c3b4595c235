//! Taxonomy cross-reference rows. These tables are seeded, so the API only
//! reads them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MeasurementUnit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionUnit {
    pub collection_unit_id: Uuid,
    pub collection_category_id: Uuid,
    pub unit_name: String,
    pub description: Option<String>,
}

crate::entity!(CollectionUnit, "xref_collection_unit", "collection_unit_id", unaudited, [
    ("collection_unit_id", Uuid),
    ("collection_category_id", Uuid),
    ("unit_name", Text),
    ("description", Text),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonCollectionCategory {
    pub collection_category_id: Uuid,
    pub itis_tsn: i32,
}

crate::entity!(TaxonCollectionCategory, "xref_taxon_collection_category", "collection_category_id", unaudited, [
    ("collection_category_id", Uuid),
    ("itis_tsn", Integer),
]);

/// Collection category joined with the taxon it is linked to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionCategoryForTaxon {
    pub collection_category_id: Uuid,
    pub category_name: String,
    pub description: Option<String>,
    pub itis_tsn: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonMarkingBodyLocation {
    pub taxon_marking_body_location_id: Uuid,
    pub itis_tsn: i32,
    pub body_location: String,
    pub description: Option<String>,
}

crate::entity!(TaxonMarkingBodyLocation, "xref_taxon_marking_body_location", "taxon_marking_body_location_id", unaudited, [
    ("taxon_marking_body_location_id", Uuid),
    ("itis_tsn", Integer),
    ("body_location", Text),
    ("description", Text),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonQualitativeMeasurement {
    pub taxon_measurement_id: Uuid,
    pub itis_tsn: i32,
    pub measurement_name: String,
    pub measurement_desc: Option<String>,
}

crate::entity!(TaxonQualitativeMeasurement, "xref_taxon_measurement_qualitative", "taxon_measurement_id", unaudited, [
    ("taxon_measurement_id", Uuid),
    ("itis_tsn", Integer),
    ("measurement_name", Text),
    ("measurement_desc", Text),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeOption {
    pub qualitative_option_id: Uuid,
    pub taxon_measurement_id: Uuid,
    pub option_label: String,
    pub option_value: i32,
    pub option_desc: Option<String>,
}

crate::entity!(QualitativeOption, "xref_taxon_measurement_qualitative_option", "qualitative_option_id", unaudited, [
    ("qualitative_option_id", Uuid),
    ("taxon_measurement_id", Uuid),
    ("option_label", Text),
    ("option_value", Integer),
    ("option_desc", Text),
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonQuantitativeMeasurement {
    pub taxon_measurement_id: Uuid,
    pub itis_tsn: i32,
    pub measurement_name: String,
    pub measurement_desc: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub unit: Option<MeasurementUnit>,
}

crate::entity!(TaxonQuantitativeMeasurement, "xref_taxon_measurement_quantitative", "taxon_measurement_id", unaudited, [
    ("taxon_measurement_id", Uuid),
    ("itis_tsn", Integer),
    ("measurement_name", Text),
    ("measurement_desc", Text),
    ("min_value", Double),
    ("max_value", Double),
    ("unit", Text),
]);

impl TaxonQuantitativeMeasurement {
    /// Whether `value` lies within the measurement's bounds, when it has any
    pub fn accepts(&self, value: f64) -> bool {
        self.min_value.map_or(true, |min| value >= min) && self.max_value.map_or(true, |max| value <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitativeMeasurementWithOptions {
    #[serde(flatten)]
    pub measurement: TaxonQualitativeMeasurement,
    pub options: Vec<QualitativeOption>,
}

/// Both measurement kinds for a taxon
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaxonMeasurements {
    pub qualitative: Vec<QualitativeMeasurementWithOptions>,
    pub quantitative: Vec<TaxonQuantitativeMeasurement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(min: Option<f64>, max: Option<f64>) -> TaxonQuantitativeMeasurement {
        TaxonQuantitativeMeasurement {
            taxon_measurement_id: Uuid::nil(),
            itis_tsn: 180703,
            measurement_name: "Weight".into(),
            measurement_desc: None,
            min_value: min,
            max_value: max,
            unit: Some(MeasurementUnit::Kilogram),
        }
    }

    #[test]
    fn bounds_are_inclusive_and_optional() {
        let bounded = measurement(Some(0.0), Some(800.0));
        assert!(bounded.accepts(0.0));
        assert!(bounded.accepts(800.0));
        assert!(!bounded.accepts(800.1));
        assert!(!bounded.accepts(-1.0));
        assert!(measurement(None, None).accepts(1e9));
        assert!(measurement(Some(5.0), None).accepts(6.0));
    }
}
