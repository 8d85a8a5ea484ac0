// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

pub mod v1;

/// Parse a boolean query value the way Go's strconv.ParseBool does, falling
/// back to `default` for anything else
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        Some("1" | "t" | "T" | "TRUE" | "true" | "True") => true,
        Some("0" | "f" | "F" | "FALSE" | "false" | "False") => false,
        _ => default,
    }
}
