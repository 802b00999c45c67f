//! Full configuration validation.
//!
//! Validates numeric ranges for every section. Each domain has its own
//! submodule; this orchestrator calls them all and collects errors into a
//! single `ConfigError`.

mod docking;
mod helpers;
mod misc;


use crate::schema::DockConfig;
use sidedock_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &DockConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    docking::validate_docking(&mut errors, config);
    misc::validate_window(&mut errors, config);
    misc::validate_startup(&mut errors, config);
    misc::validate_companion(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
