//! Docking configuration validation (gap, clamps, intervals, tiling margin).

use crate::schema::DockConfig;

use super::helpers::{validate_interval, validate_range};

const MAX_INTERVAL_MS: i64 = 60_000;

/// Validate all docking-related constraints.
pub(crate) fn validate_docking(errors: &mut Vec<String>, config: &DockConfig) {
    let docking = &config.docking;
    validate_range(
        errors,
        "docking.space_between",
        docking.space_between.into(),
        -500,
        500,
    );
    validate_range(
        errors,
        "docking.tile_height_margin",
        docking.tile_height_margin.into(),
        -200,
        200,
    );
    validate_interval(
        errors,
        "docking.slow_interval_ms",
        docking.slow_interval_ms,
        MAX_INTERVAL_MS,
    );
    validate_interval(
        errors,
        "docking.fast_interval_ms",
        docking.fast_interval_ms,
        MAX_INTERVAL_MS,
    );

    if docking.horizontal_min_enabled
        && docking.horizontal_max >= 0
        && docking.horizontal_min > docking.horizontal_max
    {
        errors.push(format!(
            "docking.horizontal_min = {} is greater than docking.horizontal_max = {}",
            docking.horizontal_min, docking.horizontal_max
        ));
    }
}
