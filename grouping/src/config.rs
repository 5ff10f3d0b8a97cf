use serde::Deserialize;
use thiserror::Error;

use crate::builtin;
use crate::configuration::Registration;
use crate::errors::RegistryError;
use crate::registry::{Registry, RegistryBuilder};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid grouping configuration: {0}")]
    Registry(#[from] RegistryError),

    #[error("default grouping configuration is not registered: {0}")]
    UnknownDefaultConfiguration(String),
}

fn default_include_builtin() -> bool {
    true
}

/// Grouping section of the config file
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Register the builtin configurations before the ones listed here.
    /// The builtin implicit base is used either way.
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,
    /// Overrides the builtin default
    #[serde(default)]
    pub default_config: Option<String>,
    /// Additional configurations, registered in the order listed
    #[serde(default)]
    pub configurations: Vec<Registration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            include_builtin: true,
            default_config: None,
            configurations: Vec::new(),
        }
    }
}

impl Config {
    pub fn build_registry(&self) -> Result<Registry, ConfigError> {
        let mut builder = if self.include_builtin {
            builtin::builder()?
        } else {
            RegistryBuilder::with_base(builtin::base()?)
        };

        for registration in &self.configurations {
            builder.register(registration.clone())?;
        }

        if let Some(default) = &self.default_config {
            if !builder.contains(default) {
                return Err(ConfigError::UnknownDefaultConfiguration(default.clone()));
            }
            builder.set_default(default)?;
        }

        Ok(builder.build())
    }
}
