use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

/// Errors raised while registering or resolving grouping configurations.
///
/// None of these are retryable: they indicate a broken configuration table
/// or a caller asking for a configuration that was never registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown base configuration `{base}` for `{id}`")]
    UnknownBaseConfiguration { id: String, base: String },

    #[error("unknown grouping configuration: {0}")]
    UnknownConfigurationId(String),

    #[error("grouping configuration is already registered: {0}")]
    DuplicateConfiguration(String),

    #[error("grouping configuration id cannot be empty")]
    EmptyConfigurationId,

    #[error("strategy `{strategy}` is listed more than once in `{id}`")]
    DuplicateStrategy { id: String, strategy: String },

    #[error("invalid strategy id `{id}`: {reason}")]
    InvalidStrategyId { id: String, reason: &'static str },

    #[error("a grouping registry is already installed")]
    RegistryAlreadyInstalled,

    #[error("no grouping registry has been installed")]
    RegistryNotInstalled,
}
