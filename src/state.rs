use std::sync::Arc;

use crate::auth::KeycloakVerifier;
use crate::config::AppConfig;
use crate::database::Database;
use crate::itis::{ItisClient, ItisError, TaxonomyService};
use crate::services::{
    BulkService, CaptureService, CollectionUnitService, CritterService, FamilyService, LocationService,
    LookupService, MarkingService, MeasurementService, MortalityService, UserService, XrefService,
};

/// Shared handles every request needs
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub verifier: Arc<KeycloakVerifier>,
    pub taxonomy: Arc<dyn TaxonomyService>,
    pub service_clients: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(
        db: Database,
        verifier: KeycloakVerifier,
        taxonomy: Arc<dyn TaxonomyService>,
        service_clients: Vec<String>,
    ) -> Self {
        Self {
            db,
            verifier: Arc::new(verifier),
            taxonomy,
            service_clients: Arc::new(service_clients),
        }
    }

    /// Wire the Keycloak verifier and ITIS client from configuration
    pub fn from_config(db: Database, config: &AppConfig) -> Result<Self, ItisError> {
        let taxonomy: Arc<dyn TaxonomyService> = Arc::new(ItisClient::new(&config.itis)?);
        Ok(Self::new(
            db,
            KeycloakVerifier::new(&config.auth),
            taxonomy,
            config.auth.service_clients.clone(),
        ))
    }

    pub fn critters(&self) -> CritterService {
        CritterService::new(self.db.clone(), self.taxonomy.clone())
    }

    pub fn captures(&self) -> CaptureService {
        CaptureService::new(self.db.clone())
    }

    pub fn mortalities(&self) -> MortalityService {
        MortalityService::new(self.db.clone(), self.taxonomy.clone())
    }

    pub fn markings(&self) -> MarkingService {
        MarkingService::new(self.db.clone(), self.taxonomy.clone())
    }

    pub fn measurements(&self) -> MeasurementService {
        MeasurementService::new(self.db.clone(), self.taxonomy.clone())
    }

    pub fn locations(&self) -> LocationService {
        LocationService::new(self.db.clone())
    }

    pub fn collection_units(&self) -> CollectionUnitService {
        CollectionUnitService::new(self.db.clone(), self.taxonomy.clone())
    }

    pub fn families(&self) -> FamilyService {
        FamilyService::new(self.db.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.clone())
    }

    pub fn lookups(&self) -> LookupService {
        LookupService::new(self.db.clone())
    }

    pub fn xref(&self) -> XrefService {
        XrefService::new(self.db.clone(), self.taxonomy.clone())
    }

    pub fn bulk(&self) -> BulkService {
        BulkService::new(self.db.clone(), self.taxonomy.clone())
    }
}
