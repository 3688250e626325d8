pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::database::catalog::Catalog;
use crate::services::coordinator_service::{PadClient, PhoneClient, SessionCoordinator};
use crate::services::scan_service::{RandomScanVerifier, ScanVerifier};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: SessionCoordinator,
    pub pad: PadClient,
    pub phone: PhoneClient,
}

impl AppState {
    pub fn new(config: &Config, catalog: Catalog) -> Self {
        let verifier = RandomScanVerifier::new(config.session.scan_success_probability);
        Self::with_verifier(config, catalog, Arc::new(verifier))
    }

    pub fn with_verifier(
        config: &Config,
        catalog: Catalog,
        verifier: Arc<dyn ScanVerifier>,
    ) -> Self {
        let coordinator = SessionCoordinator::new(
            Arc::new(catalog),
            config.session.clone(),
            config.qr_signing_secret.clone(),
            verifier,
        );
        Self {
            pad: coordinator.pad(),
            phone: coordinator.phone(),
            coordinator,
        }
    }
}
