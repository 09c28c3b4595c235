//! Multi-entity writes in one transaction.
//!
//! `POST /bulk` inserts in dependency order so later entries can reference
//! rows created earlier in the same request by their client-supplied ids.
//! `PATCH /bulk` applies updates in the same order, then deletes (entries
//! flagged `"_delete": true`) in reverse. Any failure rolls everything back.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{
    CaptureService, CollectionUnitService, CritterService, FamilyService, LocationService, MarkingService,
    MeasurementService, MortalityService, ServiceError, ServiceResult,
};
use crate::database::models::{
    CaptureCreate, CaptureUpdate, CritterCollectionUnitCreate, CritterCollectionUnitUpdate, CritterCreate,
    CritterUpdate, FamilyChildLink, FamilyCreate, FamilyParentLink, FamilyUpdate, LocationCreate, LocationUpdate,
    MarkingCreate, MarkingUpdate, MortalityCreate, MortalityUpdate, QualitativeMeasurementCreate,
    QualitativeMeasurementUpdate, QuantitativeMeasurementCreate, QuantitativeMeasurementUpdate,
};
use crate::database::Database;
use crate::itis::{TaxonomyMemo, TaxonomyService};

const DELETE_FLAG: &str = "_delete";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkCreate {
    #[serde(default)]
    pub critters: Vec<CritterCreate>,
    #[serde(default)]
    pub collections: Vec<CritterCollectionUnitCreate>,
    #[serde(default)]
    pub locations: Vec<LocationCreate>,
    #[serde(default)]
    pub captures: Vec<CaptureCreate>,
    #[serde(default)]
    pub mortalities: Vec<MortalityCreate>,
    #[serde(default)]
    pub markings: Vec<MarkingCreate>,
    #[serde(default)]
    pub qualitative_measurements: Vec<QualitativeMeasurementCreate>,
    #[serde(default)]
    pub quantitative_measurements: Vec<QuantitativeMeasurementCreate>,
    #[serde(default)]
    pub families: Vec<FamilyCreate>,
    #[serde(default)]
    pub family_parents: Vec<FamilyParentLink>,
    #[serde(default)]
    pub family_children: Vec<FamilyChildLink>,
}

/// Entries are kept as raw objects: each one carries its row id and an
/// optional `_delete` flag next to the update fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkPatch {
    #[serde(default)]
    pub critters: Vec<Value>,
    #[serde(default)]
    pub collections: Vec<Value>,
    #[serde(default)]
    pub locations: Vec<Value>,
    #[serde(default)]
    pub captures: Vec<Value>,
    #[serde(default)]
    pub mortalities: Vec<Value>,
    #[serde(default)]
    pub markings: Vec<Value>,
    #[serde(default)]
    pub qualitative_measurements: Vec<Value>,
    #[serde(default)]
    pub quantitative_measurements: Vec<Value>,
    #[serde(default)]
    pub families: Vec<Value>,
    #[serde(default)]
    pub family_parents: Vec<Value>,
    #[serde(default)]
    pub family_children: Vec<Value>,
}

/// Per-kind row counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkSummary {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub created: BTreeMap<&'static str, usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub updated: BTreeMap<&'static str, usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub deleted: BTreeMap<&'static str, usize>,
}

impl BulkSummary {
    fn count(map: &mut BTreeMap<&'static str, usize>, kind: &'static str, n: usize) {
        if n > 0 {
            *map.entry(kind).or_default() += n;
        }
    }
}

/// One parsed `PATCH /bulk` list: updates and deletes with their positions
#[derive(Debug)]
struct Split<U> {
    updates: Vec<(usize, Uuid, U)>,
    deletes: Vec<(usize, Uuid)>,
}

fn at(kind: &str, index: usize) -> String {
    format!("{}[{}]", kind, index)
}

fn split_entries<U: DeserializeOwned>(kind: &'static str, id_key: &str, entries: &[Value]) -> ServiceResult<Split<U>> {
    let mut split = Split {
        updates: Vec::new(),
        deletes: Vec::new(),
    };
    for (index, entry) in entries.iter().enumerate() {
        let (mut fields, delete) = take_delete_flag(kind, index, entry)?;
        let id = fields
            .remove(id_key)
            .and_then(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
            .ok_or_else(|| ServiceError::BadRequest(format!("{}: '{}' must be a UUID", at(kind, index), id_key)))?;
        if delete {
            split.deletes.push((index, id));
        } else {
            let update = serde_json::from_value(Value::Object(fields))
                .map_err(|e| ServiceError::BadRequest(format!("{}: {}", at(kind, index), e)))?;
            split.updates.push((index, id, update));
        }
    }
    Ok(split)
}

/// Family links have no id of their own; the link itself is the key
fn split_links<L: DeserializeOwned>(kind: &'static str, entries: &[Value]) -> ServiceResult<Vec<(usize, L, bool)>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let (fields, delete) = take_delete_flag(kind, index, entry)?;
            let link = serde_json::from_value(Value::Object(fields))
                .map_err(|e| ServiceError::BadRequest(format!("{}: {}", at(kind, index), e)))?;
            Ok((index, link, delete))
        })
        .collect()
}

fn take_delete_flag(
    kind: &str,
    index: usize,
    entry: &Value,
) -> ServiceResult<(serde_json::Map<String, Value>, bool)> {
    let mut fields = entry
        .as_object()
        .cloned()
        .ok_or_else(|| ServiceError::BadRequest(format!("{}: entry must be an object", at(kind, index))))?;
    let delete = match fields.remove(DELETE_FLAG) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => flag,
        Some(_) => {
            return Err(ServiceError::BadRequest(format!(
                "{}: '{}' must be a boolean",
                at(kind, index),
                DELETE_FLAG
            )))
        }
    };
    Ok((fields, delete))
}

pub struct BulkService {
    db: Database,
    taxonomy: Arc<dyn TaxonomyService>,
}

impl BulkService {
    pub fn new(db: Database, taxonomy: Arc<dyn TaxonomyService>) -> Self {
        Self { db, taxonomy }
    }

    pub async fn create(&self, request: BulkCreate, user_id: Uuid) -> ServiceResult<BulkSummary> {
        let taxonomy = TaxonomyMemo::new(self.taxonomy.clone());
        let mut summary = BulkSummary::default();
        let created = &mut summary.created;
        let mut tx = self.db.begin().await?;

        for (i, payload) in request.locations.into_iter().enumerate() {
            LocationService::create_in(&mut tx, payload, user_id)
                .await
                .map_err(|e| e.at(&at("locations", i)))?;
            BulkSummary::count(created, "locations", 1);
        }
        for (i, payload) in request.critters.into_iter().enumerate() {
            CritterService::create_in(&mut tx, &taxonomy, payload, user_id)
                .await
                .map_err(|e| e.at(&at("critters", i)))?;
            BulkSummary::count(created, "critters", 1);
        }
        for (i, payload) in request.families.into_iter().enumerate() {
            FamilyService::create_in(&mut tx, payload, user_id)
                .await
                .map_err(|e| e.at(&at("families", i)))?;
            BulkSummary::count(created, "families", 1);
        }
        for (i, link) in request.family_parents.into_iter().enumerate() {
            FamilyService::add_parent_in(&mut tx, link, user_id)
                .await
                .map_err(|e| e.at(&at("family_parents", i)))?;
            BulkSummary::count(created, "family_parents", 1);
        }
        for (i, link) in request.family_children.into_iter().enumerate() {
            FamilyService::add_child_in(&mut tx, link, user_id)
                .await
                .map_err(|e| e.at(&at("family_children", i)))?;
            BulkSummary::count(created, "family_children", 1);
        }
        for (i, payload) in request.collections.into_iter().enumerate() {
            CollectionUnitService::create_in(&mut tx, &taxonomy, payload, user_id)
                .await
                .map_err(|e| e.at(&at("collections", i)))?;
            BulkSummary::count(created, "collections", 1);
        }
        for (i, payload) in request.captures.into_iter().enumerate() {
            CaptureService::create_in(&mut tx, payload, user_id)
                .await
                .map_err(|e| e.at(&at("captures", i)))?;
            BulkSummary::count(created, "captures", 1);
        }
        for (i, payload) in request.mortalities.into_iter().enumerate() {
            MortalityService::create_in(&mut tx, &taxonomy, payload, user_id)
                .await
                .map_err(|e| e.at(&at("mortalities", i)))?;
            BulkSummary::count(created, "mortalities", 1);
        }
        for (i, payload) in request.markings.into_iter().enumerate() {
            MarkingService::create_in(&mut tx, &taxonomy, payload, user_id)
                .await
                .map_err(|e| e.at(&at("markings", i)))?;
            BulkSummary::count(created, "markings", 1);
        }
        for (i, payload) in request.qualitative_measurements.into_iter().enumerate() {
            MeasurementService::create_qualitative_in(&mut tx, &taxonomy, payload, user_id)
                .await
                .map_err(|e| e.at(&at("qualitative_measurements", i)))?;
            BulkSummary::count(created, "qualitative_measurements", 1);
        }
        for (i, payload) in request.quantitative_measurements.into_iter().enumerate() {
            MeasurementService::create_quantitative_in(&mut tx, &taxonomy, payload, user_id)
                .await
                .map_err(|e| e.at(&at("quantitative_measurements", i)))?;
            BulkSummary::count(created, "quantitative_measurements", 1);
        }

        tx.commit().await?;
        info!("Bulk create by {}: {:?}", user_id, summary.created);
        Ok(summary)
    }

    pub async fn patch(&self, request: BulkPatch, user_id: Uuid) -> ServiceResult<BulkSummary> {
        let critters = split_entries::<CritterUpdate>("critters", "critter_id", &request.critters)?;
        let collections =
            split_entries::<CritterCollectionUnitUpdate>("collections", "critter_collection_unit_id", &request.collections)?;
        let locations = split_entries::<LocationUpdate>("locations", "location_id", &request.locations)?;
        let captures = split_entries::<CaptureUpdate>("captures", "capture_id", &request.captures)?;
        let mortalities = split_entries::<MortalityUpdate>("mortalities", "mortality_id", &request.mortalities)?;
        let markings = split_entries::<MarkingUpdate>("markings", "marking_id", &request.markings)?;
        let qualitative = split_entries::<QualitativeMeasurementUpdate>(
            "qualitative_measurements",
            "measurement_qualitative_id",
            &request.qualitative_measurements,
        )?;
        let quantitative = split_entries::<QuantitativeMeasurementUpdate>(
            "quantitative_measurements",
            "measurement_quantitative_id",
            &request.quantitative_measurements,
        )?;
        let families = split_entries::<FamilyUpdate>("families", "family_id", &request.families)?;
        let family_parents = split_links::<FamilyParentLink>("family_parents", &request.family_parents)?;
        let family_children = split_links::<FamilyChildLink>("family_children", &request.family_children)?;

        let taxonomy = TaxonomyMemo::new(self.taxonomy.clone());
        let mut summary = BulkSummary::default();
        let mut tx = self.db.begin().await?;

        // updates, in creation order
        for (i, id, payload) in locations.updates {
            LocationService::update_in(&mut tx, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("locations", i)))?;
            BulkSummary::count(&mut summary.updated, "locations", 1);
        }
        for (i, id, payload) in critters.updates {
            CritterService::update_in(&mut tx, &taxonomy, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("critters", i)))?;
            BulkSummary::count(&mut summary.updated, "critters", 1);
        }
        for (i, id, payload) in families.updates {
            FamilyService::update_in(&mut tx, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("families", i)))?;
            BulkSummary::count(&mut summary.updated, "families", 1);
        }
        for (i, link, delete) in family_parents {
            if delete {
                FamilyService::remove_parent_in(&mut tx, link)
                    .await
                    .map_err(|e| e.at(&at("family_parents", i)))?;
                BulkSummary::count(&mut summary.deleted, "family_parents", 1);
            } else {
                FamilyService::add_parent_in(&mut tx, link, user_id)
                    .await
                    .map_err(|e| e.at(&at("family_parents", i)))?;
                BulkSummary::count(&mut summary.created, "family_parents", 1);
            }
        }
        for (i, link, delete) in family_children {
            if delete {
                FamilyService::remove_child_in(&mut tx, link)
                    .await
                    .map_err(|e| e.at(&at("family_children", i)))?;
                BulkSummary::count(&mut summary.deleted, "family_children", 1);
            } else {
                FamilyService::add_child_in(&mut tx, link, user_id)
                    .await
                    .map_err(|e| e.at(&at("family_children", i)))?;
                BulkSummary::count(&mut summary.created, "family_children", 1);
            }
        }
        for (i, id, payload) in collections.updates {
            CollectionUnitService::update_in(&mut tx, &taxonomy, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("collections", i)))?;
            BulkSummary::count(&mut summary.updated, "collections", 1);
        }
        for (i, id, payload) in captures.updates {
            CaptureService::update_in(&mut tx, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("captures", i)))?;
            BulkSummary::count(&mut summary.updated, "captures", 1);
        }
        for (i, id, payload) in mortalities.updates {
            MortalityService::update_in(&mut tx, &taxonomy, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("mortalities", i)))?;
            BulkSummary::count(&mut summary.updated, "mortalities", 1);
        }
        for (i, id, payload) in markings.updates {
            MarkingService::update_in(&mut tx, &taxonomy, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("markings", i)))?;
            BulkSummary::count(&mut summary.updated, "markings", 1);
        }
        for (i, id, payload) in qualitative.updates {
            MeasurementService::update_qualitative_in(&mut tx, &taxonomy, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("qualitative_measurements", i)))?;
            BulkSummary::count(&mut summary.updated, "qualitative_measurements", 1);
        }
        for (i, id, payload) in quantitative.updates {
            MeasurementService::update_quantitative_in(&mut tx, &taxonomy, id, payload, user_id)
                .await
                .map_err(|e| e.at(&at("quantitative_measurements", i)))?;
            BulkSummary::count(&mut summary.updated, "quantitative_measurements", 1);
        }

        // deletes, dependents first
        for (i, id) in quantitative.deletes {
            MeasurementService::delete_quantitative_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("quantitative_measurements", i)))?;
            BulkSummary::count(&mut summary.deleted, "quantitative_measurements", 1);
        }
        for (i, id) in qualitative.deletes {
            MeasurementService::delete_qualitative_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("qualitative_measurements", i)))?;
            BulkSummary::count(&mut summary.deleted, "qualitative_measurements", 1);
        }
        for (i, id) in markings.deletes {
            MarkingService::delete_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("markings", i)))?;
            BulkSummary::count(&mut summary.deleted, "markings", 1);
        }
        for (i, id) in mortalities.deletes {
            MortalityService::delete_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("mortalities", i)))?;
            BulkSummary::count(&mut summary.deleted, "mortalities", 1);
        }
        for (i, id) in captures.deletes {
            CaptureService::delete_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("captures", i)))?;
            BulkSummary::count(&mut summary.deleted, "captures", 1);
        }
        for (i, id) in collections.deletes {
            CollectionUnitService::delete_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("collections", i)))?;
            BulkSummary::count(&mut summary.deleted, "collections", 1);
        }
        for (i, id) in families.deletes {
            FamilyService::delete_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("families", i)))?;
            BulkSummary::count(&mut summary.deleted, "families", 1);
        }
        for (i, id) in critters.deletes {
            CritterService::delete_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("critters", i)))?;
            BulkSummary::count(&mut summary.deleted, "critters", 1);
        }
        for (i, id) in locations.deletes {
            LocationService::delete_in(&mut tx, id)
                .await
                .map_err(|e| e.at(&at("locations", i)))?;
            BulkSummary::count(&mut summary.deleted, "locations", 1);
        }

        tx.commit().await?;
        info!(
            "Bulk patch by {}: updated {:?}, deleted {:?}",
            user_id, summary.updated, summary.deleted
        );
        Ok(summary)
    }
}
