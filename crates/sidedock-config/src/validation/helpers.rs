//! Shared range-validation helpers used by all domain validators.

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: i64, min: i64, max: i64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is positive and above `max`. Negative values
/// mean "disabled" for interval-style settings.
pub(crate) fn validate_interval(errors: &mut Vec<String>, name: &str, value: i64, max: i64) {
    if value > max {
        errors.push(format!("{name} = {value} exceeds {max}"));
    }
}
