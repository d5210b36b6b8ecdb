//! Validation logic for label and metric names.

const fn is_valid_start_name_char(ch: u8) -> bool {
    ch == b'_' || ch.is_ascii_lowercase()
}

const fn is_valid_name_char(ch: u8) -> bool {
    ch == b'_' || ch.is_ascii_lowercase() || ch.is_ascii_digit()
}

pub(crate) const fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name cannot be empty");
    }

    let name_bytes = name.as_bytes();
    let mut idx = 0;
    while idx < name_bytes.len() {
        let ch = name_bytes[idx];
        if ch > 127 {
            return Err("name contains non-ASCII chars");
        }
        if idx == 0 && !is_valid_start_name_char(ch) {
            return Err("name starts with disallowed char (allowed chars: [_a-z])");
        } else if !is_valid_name_char(ch) {
            return Err("name contains disallowed char (allowed chars: [_a-z0-9])");
        }
        idx += 1;
    }
    Ok(())
}

/// Checks that a metric name is valid. Used in const context by the metric catalog, so an invalid name
/// fails compilation.
#[track_caller]
pub(crate) const fn assert_metric_name(name: &str) {
    if let Err(err) = validate_name(name) {
        panic!("{}", err);
    }
}
