//! Validation for smaller config sections: window, startup, and companion.

use crate::schema::DockConfig;

use super::helpers::validate_range;

/// Validate satellite window sizing. `-1` (or any non-positive value)
/// selects the default.
pub(crate) fn validate_window(errors: &mut Vec<String>, config: &DockConfig) {
    if config.window.width > 0 {
        validate_range(errors, "window.width", config.window.width.into(), 50, 4000);
    }
    if config.window.height > 0 {
        validate_range(errors, "window.height", config.window.height.into(), 50, 4000);
    }
}

/// Validate startup constraints.
pub(crate) fn validate_startup(errors: &mut Vec<String>, config: &DockConfig) {
    let timeout = i64::try_from(config.startup.collaborator_timeout_ms).unwrap_or(i64::MAX);
    validate_range(
        errors,
        "startup.collaborator_timeout_ms",
        timeout,
        0,
        300_000,
    );
}

/// Validate companion addressing.
pub(crate) fn validate_companion(errors: &mut Vec<String>, config: &DockConfig) {
    if config.companion.page_url.trim().is_empty() {
        errors.push("companion.page_url must not be empty".into());
    }
    if config.companion.internal_scheme.trim().is_empty() {
        errors.push("companion.internal_scheme must not be empty".into());
    }
}
