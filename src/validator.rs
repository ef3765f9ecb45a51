//! Field checks run on a candidate probe before it reaches the registry.
//!
//! Checks run in a fixed order (name, URL, delay) and stop at the first
//! failure, so a caller always learns about one field at a time.

use crate::common::net::parse_absolute_url;
use crate::error::{ProbeField, ValidationError};
use crate::probe::{ProbeRecord, ProbeTarget};

pub type ValidateFn = fn(&ProbeRecord) -> Result<(), ValidationError>;

pub const PROBE_VALIDATORS: [ValidateFn; 3] = [name_invalid, url_invalid, delay_invalid];

/// Runs every probe check and returns the target the URL describes.
pub fn validate_probe(record: &ProbeRecord) -> Result<ProbeTarget, ValidationError> {
    run_validators(record, &PROBE_VALIDATORS)?;
    target_of(&record.url)
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new(ProbeField::Name, "name is required"));
    }
    Ok(())
}

pub fn run_validators(record: &ProbeRecord, fns: &[ValidateFn]) -> Result<(), ValidationError> {
    fns.iter().try_for_each(|check| check(record))
}

pub fn name_invalid(record: &ProbeRecord) -> Result<(), ValidationError> {
    validate_name(&record.name)
}

pub fn url_invalid(record: &ProbeRecord) -> Result<(), ValidationError> {
    target_of(&record.url).map(|_| ())
}

pub fn delay_invalid(record: &ProbeRecord) -> Result<(), ValidationError> {
    if record.delay == 0 {
        return Err(ValidationError::new(
            ProbeField::Delay,
            "Delay must be at least 1 and strictly positive",
        ));
    }
    Ok(())
}

fn target_of(raw: &str) -> Result<ProbeTarget, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::new(ProbeField::Url, "URL is required"));
    }
    let url = parse_absolute_url(raw)
        .ok_or_else(|| ValidationError::new(ProbeField::Url, "URL is malformed"))?;
    ProbeTarget::from_url(&url).map_err(|err| ValidationError::new(ProbeField::Url, err.to_string()))
}
