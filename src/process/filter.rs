//! Row filtering by process identifier or name.

use std::fmt;

use crate::process::sample::CorrelatedProcessUsage;

/// Restricts output rows to one pid or one exact process name.
///
/// Parsed from a single user-supplied value: all digits selects a pid,
/// anything else selects a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessFilter {
    Pid(u32),
    Name(String),
}

impl ProcessFilter {
    /// Returns `None` for empty input.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(pid) = value.parse() {
                return Some(ProcessFilter::Pid(pid));
            }
        }
        Some(ProcessFilter::Name(value.to_string()))
    }

    pub fn matches(&self, row: &CorrelatedProcessUsage) -> bool {
        match self {
            ProcessFilter::Pid(pid) => row.pid == *pid,
            ProcessFilter::Name(name) => row.name == *name,
        }
    }
}

impl fmt::Display for ProcessFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessFilter::Pid(pid) => write!(f, "pid {}", pid),
            ProcessFilter::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

/// Substring include/exclude lists applied to process names.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl NameFilter {
    /// Exclude takes priority over include; an empty include list matches everything.
    pub fn should_include(&self, name: &str) -> bool {
        if let Some(ex) = &self.exclude {
            if ex.iter().any(|s| name.contains(s.as_str())) {
                return false;
            }
        }
        if let Some(inc) = &self.include {
            if !inc.is_empty() {
                return inc.iter().any(|s| name.contains(s.as_str()));
            }
        }
        true
    }
}

/// Applies the optional process filter and the name filter to `rows`.
pub fn apply_filters(
    rows: Vec<CorrelatedProcessUsage>,
    process: Option<&ProcessFilter>,
    names: &NameFilter,
) -> Vec<CorrelatedProcessUsage> {
    rows.into_iter()
        .filter(|row| process.map_or(true, |f| f.matches(row)))
        .filter(|row| names.should_include(&row.name))
        .collect()
}
