//! The grouping configurations shipped with the service.

use serde_json::{Map, Value, json};

use crate::configuration::{Registration, StrategyConfiguration};
use crate::errors::Result;
use crate::registry::{Registry, RegistryBuilder};
use crate::strategy::{RiskLevel, StrategyId};

/// Configuration assigned to new projects.
pub const DEFAULT_CONFIG_ID: &str = "newstyle:2023-01-11";

// Listed from highest to lowest priority. The first strategy to produce a
// result wins.
const BASE_STRATEGIES: &[&str] = &[
    // also handles single exceptions
    "chained-exception:v1",
    "threads:v1",
    "stacktrace:v1",
    "template:v1",
    "csp:v1",
    "hpkp:v1",
    "expect-staple:v1",
    "expect-ct:v1",
    "message:v1",
];

const BASE_DELEGATES: &[&str] = &["frame:v1", "stacktrace:v1", "single-exception:v1"];

fn strategy_ids(raw: &[&str]) -> Result<Vec<StrategyId>> {
    raw.iter().map(|id| StrategyId::new(*id)).collect()
}

fn base_context() -> Map<String, Value> {
    let mut context = Map::new();
    // Which variant should be produced.
    context.insert("variant".into(), Value::Null);
    // Set by outer strategies when they detect recursion so that the frame
    // strategy can disable itself.
    context.insert("is_recursion".into(), json!(false));
    // Message trimming and parameter substitution in the message strategy
    context.insert("normalize_message".into(), json!(true));
    context.insert("javascript_fuzzing".into(), json!(true));
    // Platforms for which the context line is taken into account
    context.insert(
        "contextline_platforms".into(),
        json!(["javascript", "node", "python", "php", "ruby"]),
    );
    context.insert("php_detect_anonymous_classes".into(), json!(false));
    context.insert("with_context_line_file_origin_bug".into(), json!(true));
    // Fall back to exception values when there is no stacktrace
    context.insert("with_exception_value_fallback".into(), json!(true));
    // The exception a stacktrace is produced for
    context.insert("exception_data".into(), Value::Null);
    // Replaces generated CGLIB and hibernate ids in Java frames
    context.insert("java_cglib_hibernate_logic".into(), json!(false));
    context
}

/// The implicit base every builtin configuration derives from.
pub fn base() -> Result<StrategyConfiguration> {
    StrategyConfiguration::base(
        strategy_ids(BASE_STRATEGIES)?,
        strategy_ids(BASE_DELEGATES)?,
        base_context(),
    )
}

fn registrations() -> Vec<Registration> {
    vec![
        // Simple rules optimized for native and javascript, but usable on
        // every platform.
        Registration::new("newstyle:2019-05-08")
            .risk(RiskLevel::High)
            .changelog(
                "
                * Uses source code information all platforms with reliable sources
                  for grouping (JavaScript, Python, PHP and Ruby) and function
                  names and filenames otherwise.
                * Fallback grouping applies clean-up logic on exception messages
                  (numbers, uuids, email addresses and others are removed)
                * JavaScript stacktraces are better deduplicated across browser
                  versions yielding a higher chance of these grouping together.
                * JavaScript stacktraces involving source maps are likely to group
                  better.
                * C/C++ and other native stacktraces are more reliably grouped.
                ",
            )
            .enhancements_base("common:2019-03-23"),
        Registration::new(DEFAULT_CONFIG_ID)
            .base("newstyle:2019-05-08")
            .risk(RiskLevel::High)
            .changelog(
                "
                * Better rules for when to take context lines into account for
                  JavaScript platforms for grouping purposes.
                * Better support for PHP7 anonymous classes.
                * Added new language/platform specific stack trace grouping enhancements rules
                  that should make the default grouping experience better.
                  This includes JavaScript, Python, PHP, Go, Java and Kotlin.
                * Added ChukloadErrors via new built-in fingerprinting support.
                ",
            )
            .context("php_detect_anonymous_classes", true)
            .context("with_context_line_file_origin_bug", false)
            .context("java_cglib_hibernate_logic", true)
            .enhancements_base("newstyle:2023-01-11")
            .fingerprinting_bases(["javascript@2024-02-02"]),
    ]
}

/// A builder preloaded with the builtin configurations, ready for more
/// registrations on top.
pub fn builder() -> Result<RegistryBuilder> {
    let mut builder = RegistryBuilder::with_base(base()?);
    for registration in registrations() {
        builder.register(registration)?;
    }
    builder.set_default(DEFAULT_CONFIG_ID)?;
    Ok(builder)
}

/// The frozen registry of builtin configurations.
pub fn registry() -> Result<Registry> {
    Ok(builder()?.build())
}
