//! Two-phase registry of grouping configurations.
//!
//! All registrations go through a [`RegistryBuilder`]. Once every
//! configuration is registered the builder is frozen into a [`Registry`],
//! which is immutable and can be cloned and shared freely. A frozen registry
//! may be installed once as the process-wide registry.

use indexmap::IndexMap;
use shared::{counter, gauge};
use std::sync::{Arc, OnceLock};

use crate::configuration::{Registration, StrategyConfiguration};
use crate::errors::{RegistryError, Result};
use crate::metrics_defs::{
    CONFIG_REGISTERED, CONFIG_RESOLVE_HIT, CONFIG_RESOLVE_MISS, REGISTRY_SIZE,
};

static INSTALLED: OnceLock<Registry> = OnceLock::new();

/// Collects registrations in dependency order.
#[derive(Debug)]
pub struct RegistryBuilder {
    base: Arc<StrategyConfiguration>,
    configurations: IndexMap<String, Arc<StrategyConfiguration>>,
    default_config: Option<String>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        RegistryBuilder::with_base(StrategyConfiguration::empty_base())
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: StrategyConfiguration) -> Self {
        RegistryBuilder {
            base: Arc::new(base),
            configurations: IndexMap::new(),
            default_config: None,
        }
    }

    /// Registers a configuration derived from its base, or from the implicit
    /// base when none is named.
    ///
    /// The base must already be registered and the id must be new.
    pub fn register(&mut self, registration: Registration) -> Result<Arc<StrategyConfiguration>> {
        if registration.id.is_empty() {
            return Err(RegistryError::EmptyConfigurationId);
        }
        if self.configurations.contains_key(&registration.id) {
            return Err(RegistryError::DuplicateConfiguration(registration.id));
        }

        let parent = match &registration.base {
            Some(base) => self.configurations.get(base).cloned().ok_or_else(|| {
                RegistryError::UnknownBaseConfiguration {
                    id: registration.id.clone(),
                    base: base.clone(),
                }
            })?,
            None => self.base.clone(),
        };

        let id = registration.id.clone();
        let config = Arc::new(StrategyConfiguration::derive(parent, registration)?);

        tracing::debug!(
            id = %id,
            base = config.parent().and_then(|p| p.id()).unwrap_or("<base>"),
            strategies = config.strategies().len(),
            "registered grouping configuration"
        );
        counter!(CONFIG_REGISTERED).increment(1);

        self.configurations.insert(id, config.clone());
        Ok(config)
    }

    /// Marks an already registered configuration as the default.
    pub fn set_default(&mut self, id: &str) -> Result<()> {
        if !self.configurations.contains_key(id) {
            return Err(RegistryError::UnknownConfigurationId(id.to_string()));
        }
        self.default_config = Some(id.to_string());
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.configurations.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Freezes the registry. No further registrations are possible.
    pub fn build(self) -> Registry {
        tracing::info!(
            configurations = self.configurations.len(),
            default = self.default_config.as_deref().unwrap_or("<none>"),
            "grouping registry frozen"
        );
        gauge!(REGISTRY_SIZE).set(self.configurations.len() as f64);

        Registry {
            inner: Arc::new(RegistryInner {
                base: self.base,
                configurations: self.configurations,
                default_config: self.default_config,
            }),
        }
    }
}

#[derive(Debug)]
struct RegistryInner {
    base: Arc<StrategyConfiguration>,
    /// Kept in registration order
    configurations: IndexMap<String, Arc<StrategyConfiguration>>,
    default_config: Option<String>,
}

/// Read-only view of the registered configurations.
#[derive(Clone, Debug)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Looks up a configuration by id.
    pub fn resolve(&self, id: &str) -> Result<Arc<StrategyConfiguration>> {
        match self.inner.configurations.get(id) {
            Some(config) => {
                counter!(CONFIG_RESOLVE_HIT).increment(1);
                Ok(config.clone())
            }
            None => {
                counter!(CONFIG_RESOLVE_MISS).increment(1);
                tracing::warn!(id, "unknown grouping configuration requested");
                Err(RegistryError::UnknownConfigurationId(id.to_string()))
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<StrategyConfiguration>> {
        self.inner.configurations.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.configurations.contains_key(id)
    }

    /// Returns configuration ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.inner.configurations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<StrategyConfiguration>> {
        self.inner.configurations.values()
    }

    /// Configurations that are not marked hidden
    pub fn visible(&self) -> impl Iterator<Item = &Arc<StrategyConfiguration>> {
        self.iter().filter(|config| !config.hidden())
    }

    pub fn len(&self) -> usize {
        self.inner.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.configurations.is_empty()
    }

    /// The implicit base all parentless configurations inherit from.
    pub fn base(&self) -> &Arc<StrategyConfiguration> {
        &self.inner.base
    }

    pub fn default_id(&self) -> Option<&str> {
        self.inner.default_config.as_deref()
    }

    pub fn default_config(&self) -> Option<&Arc<StrategyConfiguration>> {
        self.default_id().and_then(|id| self.get(id))
    }

    /// Installs this registry as the process-wide registry.
    ///
    /// Only the first call succeeds.
    pub fn install(self) -> Result<&'static Registry> {
        install_into(&INSTALLED, self)
    }

    /// Returns the process-wide registry.
    pub fn global() -> Result<&'static Registry> {
        installed_in(&INSTALLED)
    }
}

fn install_into(slot: &OnceLock<Registry>, registry: Registry) -> Result<&Registry> {
    let mut installed = false;
    let registry = slot.get_or_init(|| {
        installed = true;
        registry
    });

    if !installed {
        return Err(RegistryError::RegistryAlreadyInstalled);
    }
    tracing::info!(configurations = registry.len(), "grouping registry installed");
    Ok(registry)
}

fn installed_in(slot: &OnceLock<Registry>) -> Result<&Registry> {
    slot.get().ok_or(RegistryError::RegistryNotInstalled)
}
