use grouping::{Registry, RegistryError, StrategyConfiguration};

fn parent_id(config: &StrategyConfiguration) -> &str {
    config.parent().and_then(|p| p.id()).unwrap_or("-")
}

pub fn list(registry: &Registry, all: bool) -> String {
    let configs: Vec<_> = if all {
        registry.iter().collect()
    } else {
        registry.visible().collect()
    };

    let mut lines = Vec::with_capacity(configs.len());
    for config in configs {
        let id = config.id().unwrap_or_default();
        let mut line = format!("{id}\trisk={}\tbase={}", config.risk(), parent_id(config));
        if registry.default_id() == Some(id) {
            line.push_str("\t(default)");
        }
        if config.hidden() {
            line.push_str("\t(hidden)");
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn show(registry: &Registry, id: &str) -> Result<String, RegistryError> {
    let config = registry.resolve(id)?;
    let mut lines = vec![
        format!("id: {id}"),
        format!("base: {}", parent_id(&config)),
        format!("risk: {}", config.risk()),
        format!("default: {}", registry.default_id() == Some(id)),
        format!("hidden: {}", config.hidden()),
        format!(
            "enhancements_base: {}",
            config.enhancements_base().unwrap_or("-")
        ),
        format!(
            "fingerprinting_bases: [{}]",
            config.fingerprinting_bases().join(", ")
        ),
        "strategies:".to_string(),
    ];
    lines.extend(config.strategies().iter().map(|s| format!("  - {s}")));
    lines.push("delegates:".to_string());
    lines.extend(config.delegates().iter().map(|s| format!("  - {s}")));
    lines.push("context:".to_string());
    for (key, value) in config.effective_context() {
        let marker = if config.own_context().contains_key(&key) {
            ""
        } else {
            " (inherited)"
        };
        lines.push(format!("  {key}: {value}{marker}"));
    }
    if !config.changelog().is_empty() {
        lines.push("changelog:".to_string());
        lines.extend(config.changelog().lines().map(|l| format!("  {l}")));
    }
    Ok(lines.join("\n"))
}

/// Reports the strategy that would win for an event where only the strategies
/// named in `produces` yield a fingerprint.
pub fn pick(registry: &Registry, id: &str, produces: &[String]) -> Result<String, RegistryError> {
    let config = registry.resolve(id)?;
    let winner = config.first_match(|strategy| {
        produces
            .iter()
            .any(|name| name == strategy.name())
            .then_some(())
    });

    Ok(match winner {
        Some((strategy, ())) => format!("winner: {strategy}"),
        None => "no strategy produced a result".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grouping::{Registration, builtin};

    fn registry() -> Registry {
        let mut builder = builtin::builder().unwrap();
        builder
            .register(
                Registration::new("experimental:2024-01-01")
                    .base("newstyle:2023-01-11")
                    .hidden(true),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_list() {
        let registry = registry();
        assert_eq!(
            list(&registry, false),
            "newstyle:2019-05-08\trisk=high\tbase=-\n\
             newstyle:2023-01-11\trisk=high\tbase=newstyle:2019-05-08\t(default)"
        );
        let all = list(&registry, true);
        assert!(all.ends_with(
            "experimental:2024-01-01\trisk=low\tbase=newstyle:2023-01-11\t(hidden)"
        ));
    }

    #[test]
    fn test_show() {
        let output = show(&registry(), "newstyle:2023-01-11").unwrap();
        assert!(output.contains("base: newstyle:2019-05-08\n"));
        assert!(output.contains("default: true\n"));
        assert!(output.contains("fingerprinting_bases: [javascript@2024-02-02]\n"));
        assert!(output.contains("strategies:\n  - chained-exception:v1\n"));
        assert!(output.contains("  php_detect_anonymous_classes: true\n"));
        assert!(output.contains("  normalize_message: true (inherited)\n"));
        assert!(output.contains("changelog:\n  * Better rules"));

        assert_eq!(
            show(&registry(), "legacy:2019-03-12").unwrap_err(),
            RegistryError::UnknownConfigurationId("legacy:2019-03-12".to_string())
        );
    }

    #[test]
    fn test_pick() {
        let registry = registry();
        let produces = vec!["message".to_string(), "threads".to_string()];
        assert_eq!(
            pick(&registry, "newstyle:2023-01-11", &produces).unwrap(),
            "winner: threads:v1"
        );
        assert_eq!(
            pick(&registry, "newstyle:2023-01-11", &[]).unwrap(),
            "no strategy produced a result"
        );
        assert!(pick(&registry, "missing", &produces).is_err());
    }
}
