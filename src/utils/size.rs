// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 The lansync contributors

//! Human-readable size strings such as `10M` or `2G`.

use crate::error::{Error, Result};

/// Binary unit suffixes; a bare number is a byte count.
const UNITS: [(&str, u64); 5] = [
    ("", 1),
    ("K", 1 << 10),
    ("M", 1 << 20),
    ("G", 1 << 30),
    ("T", 1 << 40),
];

/// Parse a size such as `512`, `1024K`, `10M`, or `2G` into bytes.
///
/// The first run of digits is the quantity and the (single) run of
/// non-digits is the unit. Units are case-sensitive; `B` is not a unit.
///
/// # Errors
///
/// [`Error::InvalidSize`] when there are no digits or the result overflows,
/// [`Error::InvalidUnit`] when the unit is unknown or more than one
/// non-digit run is present (`1.5G`, `1M2`).
///
/// # Examples
///
/// ```rust,ignore
/// assert_eq!(parse_size("1M")?, 1_048_576);
/// ```
pub fn parse_size(text: &str) -> Result<u64> {
    let text = text.trim();

    let digits = text
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .ok_or_else(|| Error::InvalidSize(text.to_string()))?;
    let quantity: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidSize(text.to_string()))?;

    let unit_runs: Vec<&str> = text
        .split(|c: char| c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();
    let unit = match unit_runs.as_slice() {
        [] => "",
        [unit] => *unit,
        _ => {
            return Err(Error::InvalidUnit {
                input: text.to_string(),
                unit: unit_runs.concat(),
            });
        }
    };

    let factor = UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, factor)| *factor)
        .ok_or_else(|| Error::InvalidUnit {
            input: text.to_string(),
            unit: unit.to_string(),
        })?;

    quantity
        .checked_mul(factor)
        .ok_or_else(|| Error::InvalidSize(text.to_string()))
}
