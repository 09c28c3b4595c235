use serde::Serialize;
use serde_json::Value;

use super::{CodConfidence, CoordinateUncertaintyUnit, FrequencyUnit, MeasurementUnit, Sex};

/// Read-only `lk_*` tables exposed under `/lookups/:table`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTable {
    Colours,
    CausesOfDeath,
    MarkingMaterials,
    MarkingTypes,
    RegionEnvs,
    RegionNrs,
    Wmus,
    CollectionCategories,
}

impl LookupTable {
    pub const ALL: &'static [LookupTable] = &[
        LookupTable::Colours,
        LookupTable::CausesOfDeath,
        LookupTable::MarkingMaterials,
        LookupTable::MarkingTypes,
        LookupTable::RegionEnvs,
        LookupTable::RegionNrs,
        LookupTable::Wmus,
        LookupTable::CollectionCategories,
    ];

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.slug() == slug)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            LookupTable::Colours => "colours",
            LookupTable::CausesOfDeath => "cods",
            LookupTable::MarkingMaterials => "marking-materials",
            LookupTable::MarkingTypes => "marking-types",
            LookupTable::RegionEnvs => "region-envs",
            LookupTable::RegionNrs => "region-nrs",
            LookupTable::Wmus => "wmus",
            LookupTable::CollectionCategories => "collection-categories",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            LookupTable::Colours => "lk_colour",
            LookupTable::CausesOfDeath => "lk_cause_of_death",
            LookupTable::MarkingMaterials => "lk_marking_material",
            LookupTable::MarkingTypes => "lk_marking_type",
            LookupTable::RegionEnvs => "lk_region_env",
            LookupTable::RegionNrs => "lk_region_nr",
            LookupTable::Wmus => "lk_wildlife_management_unit",
            LookupTable::CollectionCategories => "lk_collection_category",
        }
    }

    pub fn id_column(&self) -> &'static str {
        match self {
            LookupTable::Colours => "colour_id",
            LookupTable::CausesOfDeath => "cod_id",
            LookupTable::MarkingMaterials => "marking_material_id",
            LookupTable::MarkingTypes => "marking_type_id",
            LookupTable::RegionEnvs => "region_env_id",
            LookupTable::RegionNrs => "region_nr_id",
            LookupTable::Wmus => "wmu_id",
            LookupTable::CollectionCategories => "collection_category_id",
        }
    }

    /// Column shown to users and used for ordering
    pub fn label_column(&self) -> &'static str {
        match self {
            LookupTable::Colours => "colour",
            LookupTable::CausesOfDeath => "cod_category",
            LookupTable::MarkingMaterials => "material",
            LookupTable::MarkingTypes => "name",
            LookupTable::RegionEnvs => "region_env_name",
            LookupTable::RegionNrs => "region_nr_name",
            LookupTable::Wmus => "wmu_name",
            LookupTable::CollectionCategories => "category_name",
        }
    }
}

/// Enumerations exposed under `/lookups/enum/:name`
pub fn enum_values(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "sex" => Some(Sex::ALL),
        "coordinate-uncertainty-unit" => Some(CoordinateUncertaintyUnit::ALL),
        "frequency-unit" => Some(FrequencyUnit::ALL),
        "cod-confidence" => Some(CodConfidence::ALL),
        "measurement-unit" => Some(MeasurementUnit::ALL),
        _ => None,
    }
}

/// `format=asSelect` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub id: Value,
    pub key: &'static str,
    pub value: Value,
}

impl SelectOption {
    /// Project a lookup row; rows missing the id or label column yield nulls
    pub fn from_row(table: LookupTable, row: &Value) -> Self {
        Self {
            id: row.get(table.id_column()).cloned().unwrap_or(Value::Null),
            key: table.label_column(),
            value: row.get(table.label_column()).cloned().unwrap_or(Value::Null),
        }
    }

    pub fn from_enum(value: &'static str) -> Self {
        Self {
            id: Value::String(value.to_string()),
            key: "value",
            value: Value::String(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slugs_round_trip() {
        for table in LookupTable::ALL {
            assert_eq!(LookupTable::from_slug(table.slug()), Some(*table));
            assert!(table.table().starts_with("lk_"));
        }
        assert_eq!(LookupTable::from_slug("user"), None);
    }

    #[test]
    fn enum_lists() {
        assert_eq!(enum_values("sex").map(|v| v.len()), Some(4));
        assert_eq!(enum_values("frequency-unit"), Some(&["Hz", "KHz", "MHz"][..]));
        assert!(enum_values("colour").is_none());
    }

    #[test]
    fn select_option_projects_id_and_label() {
        let row = json!({ "colour_id": "0f3c2b1a-9d8e-4f7a-8b6c-5d4e3f2a1b0c", "colour": "Blue", "hex_code": "#0000ff" });
        let option = SelectOption::from_row(LookupTable::Colours, &row);
        assert_eq!(
            serde_json::to_value(option).unwrap(),
            json!({ "id": "0f3c2b1a-9d8e-4f7a-8b6c-5d4e3f2a1b0c", "key": "colour", "value": "Blue" })
        );
    }
}
