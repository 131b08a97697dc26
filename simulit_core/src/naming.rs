//! Full-path naming rules and name resolution.
//!
//! A leaf's full name is the colon-joined path of its non-empty ancestor
//! group names followed by its own name, e.g. `Bus:Earliest`. Lookups
//! accept either the full path or any unique trailing segment run
//! (`Earliest` when only one leaf ends with `:Earliest`).

use crate::error::VariableError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path separator between group and variable names.
pub const SEPARATOR: char = ':';

/// Returns true if `name` is acceptable as a node's own name.
pub fn is_valid_name(name: &str) -> bool {
    !name.contains(SEPARATOR)
}

/// Joins a parent path and a child name, skipping empty segments.
pub fn join(parent: &str, name: &str) -> String {
    match (parent.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{}{}{}", parent, SEPARATOR, name),
    }
}

/// Why a name failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameDiagnostic {
    /// The name was empty
    Empty,
    /// The name was a bare separator
    BareSeparator,
    /// The name ended with a separator
    TrailingSeparator,
    /// The name contained two separators in a row
    DoubledSeparator,
    /// The name is well formed but nothing matched
    Absent,
}

impl NameDiagnostic {
    /// Classifies a name that did not resolve.
    pub fn of(name: &str) -> Self {
        let doubled: String = [SEPARATOR, SEPARATOR].iter().collect();
        if name.is_empty() {
            NameDiagnostic::Empty
        } else if name.len() == SEPARATOR.len_utf8() && name.starts_with(SEPARATOR) {
            NameDiagnostic::BareSeparator
        } else if name.ends_with(SEPARATOR) {
            NameDiagnostic::TrailingSeparator
        } else if name.contains(&doubled) {
            NameDiagnostic::DoubledSeparator
        } else {
            NameDiagnostic::Absent
        }
    }
}

impl fmt::Display for NameDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NameDiagnostic::Empty => "empty variable name",
            NameDiagnostic::BareSeparator => "invalid name ':'",
            NameDiagnostic::TrailingSeparator => "full name of a variable can't end with ':'",
            NameDiagnostic::DoubledSeparator => "check if you have intentionally used a double colon '::'",
            NameDiagnostic::Absent => "no variable with the specified name was found",
        };
        f.write_str(text)
    }
}

/// Resolves `query` against an ordered list of full names.
///
/// Exact match wins. Otherwise exactly one name may end with
/// `":" + query`; two or more is ambiguous, none is not-found.
pub fn resolve<'a, I>(full_names: I, query: &str) -> Result<usize, VariableError>
where
    I: IntoIterator<Item = &'a str>,
{
    if query.is_empty() {
        return Err(VariableError::not_found(query));
    }

    let suffix = format!("{}{}", SEPARATOR, query);
    let mut matches: Vec<(usize, &str)> = Vec::new();

    for (position, full_name) in full_names.into_iter().enumerate() {
        if full_name == query {
            return Ok(position);
        }
        if full_name.ends_with(&suffix) {
            matches.push((position, full_name));
        }
    }

    match matches.as_slice() {
        [] => Err(VariableError::not_found(query)),
        [(position, _)] => Ok(*position),
        many => Err(VariableError::Ambiguous {
            name: query.to_string(),
            candidates: many.iter().map(|(_, name)| name.to_string()).collect(),
        }),
    }
}

/// Returns every position whose full name equals `query` or ends with
/// `":" + query`. An exact match suppresses suffix matches.
pub fn matching<'a, I>(full_names: I, query: &str) -> Vec<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    if query.is_empty() {
        return Vec::new();
    }

    let suffix = format!("{}{}", SEPARATOR, query);
    let mut suffixed = Vec::new();

    for (position, full_name) in full_names.into_iter().enumerate() {
        if full_name == query {
            return vec![position];
        }
        if full_name.ends_with(&suffix) {
            suffixed.push(position);
        }
    }
    suffixed
}
