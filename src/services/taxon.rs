//! Checks that an observation fits the critter's place in the taxonomy.
//!
//! Xref rows are keyed by a TSN; a row applies to a critter when that TSN is
//! anywhere in the critter's ITIS hierarchy (so a body location defined for
//! Cervidae applies to every deer).

use sqlx::PgConnection;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::database::models::xref::{
    CollectionUnit, QualitativeOption, TaxonCollectionCategory, TaxonMarkingBodyLocation, TaxonQualitativeMeasurement,
    TaxonQuantitativeMeasurement,
};
use crate::database::models::Critter;
use crate::database::Repository;
use crate::itis::{ItisError, TaxonomyService};
use crate::validation::ValidationError;

/// A rule an entry breaks, tied to the field at fault
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub field: &'static str,
    pub reason: String,
}

impl Problem {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl From<Problem> for ServiceError {
    fn from(problem: Problem) -> Self {
        ServiceError::Validation(ValidationError::field(problem.field, problem.reason))
    }
}

/// Fail with the problem, if any
pub fn ensure(problem: Option<Problem>) -> ServiceResult<()> {
    match problem {
        Some(problem) => Err(problem.into()),
        None => Ok(()),
    }
}

/// The TSN must exist in ITIS
pub async fn ensure_tsn(taxonomy: &dyn TaxonomyService, tsn: i32, field: &'static str) -> ServiceResult<String> {
    match taxonomy.scientific_name(tsn).await {
        Ok(name) => Ok(name),
        Err(ItisError::NotFound(_)) => Err(Problem::new(field, format!("TSN {} does not exist in ITIS", tsn)).into()),
        Err(e) => Err(e.into()),
    }
}

async fn critter_hierarchy(
    conn: &mut PgConnection,
    taxonomy: &dyn TaxonomyService,
    critter_id: Uuid,
) -> ServiceResult<Result<Vec<i32>, Problem>> {
    let critter = Repository::<Critter>::new().find_by_id(conn, critter_id).await?;
    match critter {
        Some(critter) => known_hierarchy(critter.itis_tsn, taxonomy.tsn_hierarchy(critter.itis_tsn).await),
        None => Ok(Err(Problem::new(
            "critter_id",
            format!("critter {} does not exist", critter_id),
        ))),
    }
}

/// A critter whose TSN ITIS does not know is a problem with that entry;
/// any other taxonomy failure fails the request
fn known_hierarchy(
    tsn: i32,
    lookup: Result<Vec<i32>, ItisError>,
) -> ServiceResult<Result<Vec<i32>, Problem>> {
    match lookup {
        Ok(hierarchy) => Ok(Ok(hierarchy)),
        Err(ItisError::NotFound(_)) => Ok(Err(Problem::new(
            "critter_id",
            format!("critter's TSN {} does not exist in ITIS", tsn),
        ))),
        Err(e) => Err(e.into()),
    }
}

pub async fn marking_problem(
    conn: &mut PgConnection,
    taxonomy: &dyn TaxonomyService,
    critter_id: Uuid,
    body_location_id: Uuid,
) -> ServiceResult<Option<Problem>> {
    let hierarchy = match critter_hierarchy(&mut *conn, taxonomy, critter_id).await? {
        Ok(hierarchy) => hierarchy,
        Err(problem) => return Ok(Some(problem)),
    };
    let location = Repository::<TaxonMarkingBodyLocation>::new()
        .find_by_id(conn, body_location_id)
        .await?;
    Ok(match location {
        None => Some(Problem::new(
            "taxon_marking_body_location_id",
            format!("body location {} does not exist", body_location_id),
        )),
        Some(location) if !hierarchy.contains(&location.itis_tsn) => Some(Problem::new(
            "taxon_marking_body_location_id",
            format!("body location '{}' does not apply to this critter's taxon", location.body_location),
        )),
        Some(_) => None,
    })
}

pub async fn qualitative_problem(
    conn: &mut PgConnection,
    taxonomy: &dyn TaxonomyService,
    critter_id: Uuid,
    taxon_measurement_id: Uuid,
    qualitative_option_id: Uuid,
) -> ServiceResult<Option<Problem>> {
    let hierarchy = match critter_hierarchy(&mut *conn, taxonomy, critter_id).await? {
        Ok(hierarchy) => hierarchy,
        Err(problem) => return Ok(Some(problem)),
    };
    let measurement = Repository::<TaxonQualitativeMeasurement>::new()
        .find_by_id(&mut *conn, taxon_measurement_id)
        .await?;
    let measurement = match measurement {
        None => {
            return Ok(Some(Problem::new(
                "taxon_measurement_id",
                format!("qualitative measurement {} does not exist", taxon_measurement_id),
            )))
        }
        Some(m) if !hierarchy.contains(&m.itis_tsn) => {
            return Ok(Some(Problem::new(
                "taxon_measurement_id",
                format!("measurement '{}' does not apply to this critter's taxon", m.measurement_name),
            )))
        }
        Some(m) => m,
    };
    let option = Repository::<QualitativeOption>::new()
        .find_by_id(conn, qualitative_option_id)
        .await?;
    Ok(match option {
        Some(option) if option.taxon_measurement_id == measurement.taxon_measurement_id => None,
        Some(option) => Some(Problem::new(
            "qualitative_option_id",
            format!(
                "option '{}' is not an option of measurement '{}'",
                option.option_label, measurement.measurement_name
            ),
        )),
        None => Some(Problem::new(
            "qualitative_option_id",
            format!("qualitative option {} does not exist", qualitative_option_id),
        )),
    })
}

pub async fn quantitative_problem(
    conn: &mut PgConnection,
    taxonomy: &dyn TaxonomyService,
    critter_id: Uuid,
    taxon_measurement_id: Uuid,
    value: f64,
) -> ServiceResult<Option<Problem>> {
    let hierarchy = match critter_hierarchy(&mut *conn, taxonomy, critter_id).await? {
        Ok(hierarchy) => hierarchy,
        Err(problem) => return Ok(Some(problem)),
    };
    let measurement = Repository::<TaxonQuantitativeMeasurement>::new()
        .find_by_id(conn, taxon_measurement_id)
        .await?;
    Ok(match measurement {
        None => Some(Problem::new(
            "taxon_measurement_id",
            format!("quantitative measurement {} does not exist", taxon_measurement_id),
        )),
        Some(m) if !hierarchy.contains(&m.itis_tsn) => Some(Problem::new(
            "taxon_measurement_id",
            format!("measurement '{}' does not apply to this critter's taxon", m.measurement_name),
        )),
        Some(m) if !m.accepts(value) => Some(Problem::new(
            "value",
            format!(
                "{} is outside the range {} to {} for '{}'",
                value,
                m.min_value.map_or("-inf".to_string(), |v| v.to_string()),
                m.max_value.map_or("inf".to_string(), |v| v.to_string()),
                m.measurement_name
            ),
        )),
        Some(_) => None,
    })
}

pub async fn collection_unit_problem(
    conn: &mut PgConnection,
    taxonomy: &dyn TaxonomyService,
    critter_id: Uuid,
    collection_unit_id: Uuid,
) -> ServiceResult<Option<Problem>> {
    let hierarchy = match critter_hierarchy(&mut *conn, taxonomy, critter_id).await? {
        Ok(hierarchy) => hierarchy,
        Err(problem) => return Ok(Some(problem)),
    };
    let unit = Repository::<CollectionUnit>::new()
        .find_by_id(&mut *conn, collection_unit_id)
        .await?;
    let Some(unit) = unit else {
        return Ok(Some(Problem::new(
            "collection_unit_id",
            format!("collection unit {} does not exist", collection_unit_id),
        )));
    };
    let links = Repository::<TaxonCollectionCategory>::new()
        .find_where(
            conn,
            &serde_json::json!({
                "collection_category_id": unit.collection_category_id.to_string(),
                "itis_tsn": { "$in": hierarchy },
            }),
        )
        .await?;
    Ok(if links.is_empty() {
        Some(Problem::new(
            "collection_unit_id",
            format!("collection unit '{}' is not available for this critter's taxon", unit.unit_name),
        ))
    } else {
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itis::StaticTaxonomy;

    #[tokio::test]
    async fn unknown_tsn_is_a_field_error() {
        let taxonomy = StaticTaxonomy::new().with_taxon(180703, "Alces alces", &[202423, 180703]);
        assert_eq!(ensure_tsn(&taxonomy, 180703, "itis_tsn").await.unwrap(), "Alces alces");
        match ensure_tsn(&taxonomy, 42, "proximate_predated_by_itis_tsn").await {
            Err(ServiceError::Validation(err)) => {
                assert!(err.field_errors.contains_key("proximate_predated_by_itis_tsn"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_critter_tsn_is_an_entry_problem() {
        let problem = known_hierarchy(999_999, Err(ItisError::NotFound(999_999))).unwrap().unwrap_err();
        assert_eq!(problem.field, "critter_id");
        assert!(problem.reason.contains("999999"));

        assert_eq!(known_hierarchy(180703, Ok(vec![180692, 180703])).unwrap(), Ok(vec![180692, 180703]));
        assert!(matches!(
            known_hierarchy(180703, Err(ItisError::InvalidResponse("no docs".into()))),
            Err(ServiceError::Taxonomy(_))
        ));
    }

    #[test]
    fn ensure_passes_through_no_problem() {
        assert!(ensure(None).is_ok());
        assert!(ensure(Some(Problem::new("value", "too big"))).is_err());
    }
}
