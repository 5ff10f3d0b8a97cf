//! Grouping configurations.
//!
//! A configuration bundles an ordered list of strategies, the delegates those
//! strategies call into, and a context of default values. Every configuration
//! except the implicit base points at a parent. Strategy and delegate lists
//! are resolved when the configuration is created; context lookups walk the
//! parent chain so that the nearest override wins.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::errors::{RegistryError, Result};
use crate::strategy::{RiskLevel, StrategyId, StrategyList, find_duplicate};

/// A request to register a named configuration.
///
/// Also the shape of a configuration entry in the YAML config file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Registration {
    pub id: String,
    /// Parent configuration. The implicit base is used when unset.
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub strategies: Option<StrategyList>,
    #[serde(default)]
    pub delegates: Option<StrategyList>,
    /// Context values overriding the ones inherited from the parent
    #[serde(default)]
    pub initial_context: Map<String, Value>,
    #[serde(default)]
    pub risk: RiskLevel,
    #[serde(default)]
    pub changelog: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub enhancements_base: Option<String>,
    #[serde(default)]
    pub fingerprinting_bases: Option<Vec<String>>,
}

impl Registration {
    pub fn new(id: impl Into<String>) -> Self {
        Registration {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn strategies(mut self, strategies: StrategyList) -> Self {
        self.strategies = Some(strategies);
        self
    }

    pub fn delegates(mut self, delegates: StrategyList) -> Self {
        self.delegates = Some(delegates);
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.initial_context.insert(key.into(), value.into());
        self
    }

    pub fn risk(mut self, risk: RiskLevel) -> Self {
        self.risk = risk;
        self
    }

    pub fn changelog(mut self, changelog: impl Into<String>) -> Self {
        self.changelog = changelog.into();
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn enhancements_base(mut self, enhancements_base: impl Into<String>) -> Self {
        self.enhancements_base = Some(enhancements_base.into());
        self
    }

    pub fn fingerprinting_bases<I, S>(mut self, bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fingerprinting_bases = Some(bases.into_iter().map(Into::into).collect());
        self
    }
}

/// An immutable, resolved grouping configuration.
#[derive(Debug)]
pub struct StrategyConfiguration {
    /// `None` only for the implicit base
    id: Option<String>,
    parent: Option<Arc<StrategyConfiguration>>,
    strategies: Vec<StrategyId>,
    delegates: Vec<StrategyId>,
    /// Only the values set on this configuration, not the inherited ones
    context: Map<String, Value>,
    risk: RiskLevel,
    changelog: String,
    hidden: bool,
    enhancements_base: Option<String>,
    fingerprinting_bases: Vec<String>,
}

impl StrategyConfiguration {
    /// Builds the implicit base every parentless configuration inherits from.
    pub fn base(
        strategies: Vec<StrategyId>,
        delegates: Vec<StrategyId>,
        context: Map<String, Value>,
    ) -> Result<Self> {
        for list in [&strategies, &delegates] {
            if let Some(duplicate) = find_duplicate(list) {
                return Err(RegistryError::DuplicateStrategy {
                    id: "base".to_string(),
                    strategy: duplicate.to_string(),
                });
            }
        }

        Ok(StrategyConfiguration {
            id: None,
            parent: None,
            strategies,
            delegates,
            context,
            risk: RiskLevel::default(),
            changelog: String::new(),
            hidden: true,
            enhancements_base: None,
            fingerprinting_bases: Vec::new(),
        })
    }

    /// A base without strategies, delegates or context defaults.
    pub fn empty_base() -> Self {
        StrategyConfiguration {
            id: None,
            parent: None,
            strategies: Vec::new(),
            delegates: Vec::new(),
            context: Map::new(),
            risk: RiskLevel::default(),
            changelog: String::new(),
            hidden: true,
            enhancements_base: None,
            fingerprinting_bases: Vec::new(),
        }
    }

    /// Derives a named configuration from `parent`.
    ///
    /// The caller is responsible for resolving `registration.base` to `parent`.
    pub(crate) fn derive(
        parent: Arc<StrategyConfiguration>,
        registration: Registration,
    ) -> Result<Self> {
        let Registration {
            id,
            base: _,
            strategies,
            delegates,
            initial_context,
            risk,
            changelog,
            hidden,
            enhancements_base,
            fingerprinting_bases,
        } = registration;

        // Checked before merging, since `Extend` folds same-name entries
        // into one slot.
        for list in [&strategies, &delegates].into_iter().flatten() {
            if let Some(duplicate) = find_duplicate(list.ids()) {
                return Err(RegistryError::DuplicateStrategy {
                    id,
                    strategy: duplicate.to_string(),
                });
            }
        }

        let strategies = match &strategies {
            Some(list) => list.apply(&parent.strategies),
            None => parent.strategies.clone(),
        };
        let delegates = match &delegates {
            Some(list) => list.apply(&parent.delegates),
            None => parent.delegates.clone(),
        };

        for list in [&strategies, &delegates] {
            if let Some(duplicate) = find_duplicate(list) {
                return Err(RegistryError::DuplicateStrategy {
                    id,
                    strategy: duplicate.to_string(),
                });
            }
        }

        Ok(StrategyConfiguration {
            enhancements_base: enhancements_base.or_else(|| parent.enhancements_base.clone()),
            fingerprinting_bases: fingerprinting_bases
                .unwrap_or_else(|| parent.fingerprinting_bases.clone()),
            id: Some(id),
            parent: Some(parent),
            strategies,
            delegates,
            context: initial_context,
            risk,
            changelog: clean_changelog(&changelog),
            hidden,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_base(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<&Arc<StrategyConfiguration>> {
        self.parent.as_ref()
    }

    /// Strategies in priority order, highest first
    pub fn strategies(&self) -> &[StrategyId] {
        &self.strategies
    }

    pub fn delegates(&self) -> &[StrategyId] {
        &self.delegates
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk
    }

    pub fn changelog(&self) -> &str {
        &self.changelog
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn enhancements_base(&self) -> Option<&str> {
        self.enhancements_base.as_deref()
    }

    pub fn fingerprinting_bases(&self) -> &[String] {
        &self.fingerprinting_bases
    }

    /// Context values set directly on this configuration.
    pub fn own_context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// This configuration followed by its parents, ending with the base.
    pub fn ancestors(&self) -> impl Iterator<Item = &StrategyConfiguration> {
        std::iter::successors(Some(self), |config| config.parent.as_deref())
    }

    /// Looks up a context value, preferring the nearest override.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.ancestors().find_map(|config| config.context.get(key))
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// The full context with every inherited value applied.
    pub fn effective_context(&self) -> Map<String, Value> {
        let chain: Vec<_> = self.ancestors().collect();
        let mut context = Map::new();
        for config in chain.into_iter().rev() {
            for (key, value) in &config.context {
                context.insert(key.clone(), value.clone());
            }
        }
        context
    }

    /// Finds a strategy or delegate by name, returning the configured version.
    pub fn strategy(&self, name: &str) -> Option<&StrategyId> {
        self.strategies.iter().find(|id| id.name() == name)
    }

    pub fn is_delegate(&self, id: &StrategyId) -> bool {
        self.delegates.contains(id)
    }

    /// Runs `produce` over the strategies in priority order and returns the
    /// first one that yields a result, together with that result.
    ///
    /// `produce` returns `None` when a strategy has nothing to contribute for
    /// the event. Strategies after the winner are not evaluated.
    pub fn first_match<T, F>(&self, mut produce: F) -> Option<(&StrategyId, T)>
    where
        F: FnMut(&StrategyId) -> Option<T>,
    {
        self.strategies
            .iter()
            .find_map(|id| produce(id).map(|result| (id, result)))
    }
}

/// Strips surrounding blank lines and the common indentation of a changelog
/// written as an indented block.
fn clean_changelog(raw: &str) -> String {
    let is_indent = |b: &u8| *b == b' ' || *b == b'\t';
    let lines: Vec<&str> = raw.lines().collect();

    // The first line is usually on the same line as the opening quote, so it
    // does not count towards the common indentation.
    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.bytes().take_while(is_indent).count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let strip = if i == 0 {
                line.bytes().take_while(is_indent).count()
            } else {
                line.bytes().take(indent).take_while(is_indent).count()
            };
            line[strip..].trim_end()
        })
        .collect();

    while cleaned.first().is_some_and(|line| line.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(raw: &[&str]) -> Vec<StrategyId> {
        raw.iter().map(|s| StrategyId::new(*s).unwrap()).collect()
    }

    fn base() -> Arc<StrategyConfiguration> {
        let context = json!({"variant": null, "normalize_message": true, "platforms": ["python"]});
        Arc::new(
            StrategyConfiguration::base(
                ids(&["threads:v1", "stacktrace:v1", "message:v1"]),
                ids(&["frame:v1"]),
                context.as_object().unwrap().clone(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_derive_inherits_lists() {
        let config = StrategyConfiguration::derive(base(), Registration::new("child")).unwrap();

        assert_eq!(config.id(), Some("child"));
        assert!(!config.is_base());
        assert_eq!(config.strategies(), ids(&["threads:v1", "stacktrace:v1", "message:v1"]));
        assert_eq!(config.delegates(), ids(&["frame:v1"]));
        assert_eq!(config.risk(), RiskLevel::Low);
        assert!(config.own_context().is_empty());
    }

    #[test]
    fn test_derive_overrides_lists() {
        let registration = Registration::new("child")
            .strategies(StrategyList::Replace(ids(&["message:v2"])))
            .delegates(StrategyList::extend(ids(&["frame:v2", "single-exception:v1"])));
        let config = StrategyConfiguration::derive(base(), registration).unwrap();

        assert_eq!(config.strategies(), ids(&["message:v2"]));
        assert_eq!(config.delegates(), ids(&["frame:v2", "single-exception:v1"]));
    }

    #[test]
    fn test_derive_rejects_duplicate_strategy() {
        let registration = Registration::new("child")
            .strategies(StrategyList::Replace(ids(&["message:v1", "message:v2"])));
        let err = StrategyConfiguration::derive(base(), registration).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateStrategy {
                id: "child".to_string(),
                strategy: "message:v2".to_string(),
            }
        );
    }

    #[test]
    fn test_derive_rejects_duplicate_in_extend() {
        let registration = Registration::new("child")
            .strategies(StrategyList::extend(ids(&["message:v2", "message:v3"])));
        let err = StrategyConfiguration::derive(base(), registration).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateStrategy {
                id: "child".to_string(),
                strategy: "message:v3".to_string(),
            }
        );

        let registration = Registration::new("child")
            .delegates(StrategyList::extend(ids(&["frame:v2", "frame:v3"])));
        assert!(matches!(
            StrategyConfiguration::derive(base(), registration),
            Err(RegistryError::DuplicateStrategy { .. })
        ));
    }

    #[test]
    fn test_context_lookup_walks_parents() {
        let parent = Arc::new(
            StrategyConfiguration::derive(
                base(),
                Registration::new("parent")
                    .context("normalize_message", false)
                    .context("a", 1),
            )
            .unwrap(),
        );
        let child = StrategyConfiguration::derive(
            parent.clone(),
            Registration::new("child").context("a", 2).context("b", "x"),
        )
        .unwrap();

        assert_eq!(child.get("a"), Some(&json!(2)));
        assert_eq!(child.get("b"), Some(&json!("x")));
        assert_eq!(child.get("normalize_message"), Some(&json!(false)));
        assert_eq!(child.get("variant"), Some(&Value::Null));
        assert_eq!(child.get("platforms"), Some(&json!(["python"])));
        assert_eq!(child.get("missing"), None);
        assert_eq!(child.get_or("missing", &json!(7)), &json!(7));
        assert_eq!(parent.get("a"), Some(&json!(1)));
        assert_eq!(parent.get("b"), None);

        let chain: Vec<_> = child.ancestors().map(|c| c.id()).collect();
        assert_eq!(chain, vec![Some("child"), Some("parent"), None]);
    }

    #[test]
    fn test_effective_context() {
        let child = StrategyConfiguration::derive(
            base(),
            Registration::new("child")
                .context("normalize_message", false)
                .context("extra", true),
        )
        .unwrap();

        let context = child.effective_context();
        let keys: Vec<_> = context.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["variant", "normalize_message", "platforms", "extra"]);
        assert_eq!(context["normalize_message"], json!(false));
    }

    #[test]
    fn test_bases_inherit_unless_overridden() {
        let parent = Arc::new(
            StrategyConfiguration::derive(
                base(),
                Registration::new("parent")
                    .enhancements_base("common:2019-03-23")
                    .fingerprinting_bases(["javascript@2024-02-02"])
                    .risk(RiskLevel::High),
            )
            .unwrap(),
        );
        let child =
            StrategyConfiguration::derive(parent.clone(), Registration::new("child")).unwrap();
        assert_eq!(child.enhancements_base(), Some("common:2019-03-23"));
        assert_eq!(child.fingerprinting_bases(), ["javascript@2024-02-02"]);
        // risk describes the configuration itself and is not inherited
        assert_eq!(child.risk(), RiskLevel::Low);

        let child = StrategyConfiguration::derive(
            parent,
            Registration::new("child")
                .enhancements_base("newstyle:2023-01-11")
                .fingerprinting_bases(Vec::<String>::new()),
        )
        .unwrap();
        assert_eq!(child.enhancements_base(), Some("newstyle:2023-01-11"));
        assert!(child.fingerprinting_bases().is_empty());
    }

    #[test]
    fn test_first_match_uses_declared_order() {
        let config = StrategyConfiguration::derive(base(), Registration::new("child")).unwrap();

        let mut evaluated = Vec::new();
        let winner = config.first_match(|id| {
            evaluated.push(id.name().to_string());
            match id.name() {
                "stacktrace" => Some("stack-hash"),
                "message" => Some("message-hash"),
                _ => None,
            }
        });

        let (id, result) = winner.unwrap();
        assert_eq!(id.as_str(), "stacktrace:v1");
        assert_eq!(result, "stack-hash");
        assert_eq!(evaluated, vec!["threads", "stacktrace"]);

        assert!(config.first_match(|_| None::<()>).is_none());
    }

    #[test]
    fn test_strategy_lookup() {
        let config = base();
        assert_eq!(config.strategy("stacktrace").map(StrategyId::as_str), Some("stacktrace:v1"));
        assert!(config.strategy("frame").is_none());
        assert!(config.is_delegate(&StrategyId::new("frame:v1").unwrap()));
        assert!(!config.is_delegate(&StrategyId::new("frame:v2").unwrap()));
    }

    #[test]
    fn test_base_rejects_duplicates() {
        let err = StrategyConfiguration::base(
            ids(&["frame:v1", "frame:v2"]),
            Vec::new(),
            Map::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateStrategy { .. }));
    }

    #[test]
    fn test_clean_changelog() {
        let raw = "
        * Uses source code information
          for grouping.
        * Better rules.
    ";
        assert_eq!(
            clean_changelog(raw),
            "* Uses source code information\n  for grouping.\n* Better rules."
        );
        assert_eq!(clean_changelog(""), "");
        assert_eq!(clean_changelog("  single line  "), "single line");
    }
}
