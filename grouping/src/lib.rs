//! Registry of grouping configurations.
//!
//! A grouping configuration names the ordered fingerprinting strategies used
//! to decide whether two error events belong to the same issue, together with
//! delegates and inheritable context defaults. Configurations are registered
//! once at startup through a [`RegistryBuilder`], then frozen into a
//! read-only [`Registry`] that is looked up by id while processing events.

pub mod builtin;
pub mod config;
pub mod configuration;
pub mod errors;
pub mod metrics_defs;
pub mod registry;
pub mod strategy;

pub use configuration::{Registration, StrategyConfiguration};
pub use errors::{RegistryError, Result};
pub use registry::{Registry, RegistryBuilder};
pub use strategy::{ExtendList, RiskLevel, StrategyId, StrategyList};
