// Write-time input checks for names, port mappings and domain names

use crate::error::{Error, Result};

/// Non-empty after trimming and at least `min_len` characters.
pub fn name(field: &str, value: &str, min_len: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidParameter(format!("{} is required", field)));
    }
    if trimmed.chars().count() < min_len {
        return Err(Error::InvalidParameter(format!(
            "{} must be at least {} characters",
            field, min_len
        )));
    }
    Ok(())
}

/// `host:container` (e.g. `8080:80`) or a single port; every port in 1..=65535.
pub fn port_mapping(value: &str) -> Result<()> {
    let trimmed = value.trim();
    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(Error::InvalidParameter(format!(
            "port must be HOST:CONTAINER or PORT, got {:?}",
            value
        )));
    }
    for p in parts {
        match p.parse::<u16>() {
            Ok(n) if n > 0 => {}
            _ => {
                return Err(Error::InvalidParameter(format!(
                    "port must be HOST:CONTAINER or PORT, got {:?}",
                    value
                )));
            }
        }
    }
    Ok(())
}

/// Dotted name without whitespace, labels made of alphanumerics and hyphens.
pub fn domain_name(value: &str) -> Result<()> {
    let trimmed = value.trim();
    let invalid = || Error::InvalidParameter(format!("invalid domain name {:?}", value));
    if trimmed.is_empty() || !trimmed.contains('.') || trimmed.len() > 253 {
        return Err(invalid());
    }
    for label in trimmed.split('.') {
        if label.is_empty()
            || label.len() > 63
            || label.starts_with('-')
            || label.ends_with('-')
            || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(invalid());
        }
    }
    Ok(())
}
