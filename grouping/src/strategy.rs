//! Strategy identifiers and the list overrides used when deriving one
//! configuration from another.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::RegistryError;

/// Identifies a versioned grouping strategy, e.g. `stacktrace:v1`.
///
/// The part before the colon is the strategy name. Two ids sharing a name
/// are different versions of the same strategy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct StrategyId {
    raw: String,
    split: usize,
}

impl StrategyId {
    pub fn new(raw: impl Into<String>) -> Result<Self, RegistryError> {
        let raw = raw.into();
        let invalid = |reason: &'static str| RegistryError::InvalidStrategyId {
            id: raw.clone(),
            reason,
        };

        let Some(split) = raw.find(':') else {
            return Err(invalid("expected `<name>:<version>`"));
        };
        let (name, version) = (&raw[..split], &raw[split + 1..]);

        if name.is_empty() {
            return Err(invalid("strategy name cannot be empty"));
        }
        if version.is_empty() {
            return Err(invalid("strategy version cannot be empty"));
        }
        if version.contains(':') {
            return Err(invalid("expected a single `:` separator"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(invalid("strategy name must contain only [a-z0-9_-]"));
        }

        Ok(StrategyId { raw, split })
    }

    pub fn name(&self) -> &str {
        &self.raw[..self.split]
    }

    pub fn version(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for StrategyId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::new(s)
    }
}

impl TryFrom<String> for StrategyId {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        StrategyId::new(value)
    }
}

impl From<StrategyId> for String {
    fn from(id: StrategyId) -> Self {
        id.raw
    }
}

/// How risky it is to move a project onto a configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Override applied to an inherited strategy or delegate list.
///
/// In YAML a plain sequence replaces the parent's list, while
/// `{extend: [...]}` keeps it and swaps in new versions by strategy name.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StrategyList {
    Replace(Vec<StrategyId>),
    Extend(ExtendList),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtendList {
    pub extend: Vec<StrategyId>,
}

impl StrategyList {
    pub fn extend(ids: Vec<StrategyId>) -> Self {
        StrategyList::Extend(ExtendList { extend: ids })
    }

    /// The ids named by the override itself, before any merging.
    pub fn ids(&self) -> &[StrategyId] {
        match self {
            StrategyList::Replace(ids) => ids,
            StrategyList::Extend(list) => &list.extend,
        }
    }

    /// Applies the override to `inherited`, returning the effective list.
    ///
    /// `Extend` replaces an inherited entry in place when a new entry shares
    /// its name, and appends entries with names not seen before.
    pub(crate) fn apply(&self, inherited: &[StrategyId]) -> Vec<StrategyId> {
        match self {
            StrategyList::Replace(ids) => ids.clone(),
            StrategyList::Extend(list) => {
                let mut merged = inherited.to_vec();
                for id in &list.extend {
                    match merged.iter_mut().find(|existing| existing.name() == id.name()) {
                        Some(slot) => *slot = id.clone(),
                        None => merged.push(id.clone()),
                    }
                }
                merged
            }
        }
    }
}

/// Returns the first strategy name that appears more than once in `ids`.
pub(crate) fn find_duplicate(ids: &[StrategyId]) -> Option<&StrategyId> {
    ids.iter()
        .enumerate()
        .find(|(i, id)| ids[..*i].iter().any(|prev| prev.name() == id.name()))
        .map(|(_, id)| id)
}
