//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{DumpKind, DumperConfig};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    pattern: String,
    static_variables: Vec<String>,
    strategy: String,
    stats_interval_ms: Option<u64>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    pattern: config.node.pattern.clone(),
                    static_variables: config.node.data.keys().cloned().collect(),
                    strategy: format!("{:?}", config.dump.strategy).to_lowercase(),
                    stats_interval_ms: config.stats.enabled.then_some(config.stats.interval_ms),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &DumperConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let pattern = &config.node.pattern;

    // Without a per-packet variable every packet lands on the same destination
    if !uses_per_packet_variable(pattern) {
        warnings.push(format!(
            "pattern '{pattern}' uses none of count/pts/streamIndex - \
             every packet gets the same destination"
        ));
    }

    if config.dump.strategy == DumpKind::Log && config.dump.create_dirs {
        warnings.push("dump.create_dirs has no effect with the log strategy".to_string());
    }

    warnings
}

fn uses_per_packet_variable(pattern: &str) -> bool {
    naming::RESERVED_VARIABLES
        .iter()
        .any(|name| naming::mentions_variable(pattern, name))
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Pattern: {}", summary.pattern);
            println!("  Static variables: {:?}", summary.static_variables);
            println!("  Strategy: {}", summary.strategy);
            match summary.stats_interval_ms {
                Some(ms) => println!("  Stats: every {}ms", ms),
                None => println!("  Stats: disabled"),
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dumper.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_valid_config_summary() {
        let (_dir, config) = write_config(
            "[node]\npattern = \"{{session}}-{{count}}\"\n[node.data]\nsession = \"a\"\n",
        );
        let result = validate_config(&ValidateArgs {
            config,
            json: true,
        });

        assert!(result.valid);
        assert!(result.warnings.is_none());
        let summary = result.summary.unwrap();
        assert_eq!(summary.strategy, "file");
        assert_eq!(summary.static_variables, vec!["session".to_string()]);
    }

    #[test]
    fn test_constant_pattern_warns() {
        let (_dir, config) = write_config("[node]\npattern = \"same.raw\"\n");
        let result = validate_config(&ValidateArgs {
            config,
            json: false,
        });
        assert!(result.valid);
        assert_eq!(result.warnings.unwrap().len(), 1);
    }

    #[test]
    fn test_spaced_and_helper_variables_do_not_warn() {
        assert!(uses_per_packet_variable("pkt-{{ count }}.raw"));
        assert!(uses_per_packet_variable("{{#if (eq pts 0)}}first{{else}}rest{{/if}}"));
        assert!(uses_per_packet_variable(r"C:\out\{{streamIndex}}.raw"));
        assert!(!uses_per_packet_variable("{{counter}}.raw"));

        let (_dir, config) = write_config("[node]\npattern = \"pkt-{{ count }}.raw\"\n");
        let result = validate_config(&ValidateArgs {
            config,
            json: false,
        });
        assert!(result.valid);
        assert!(result.warnings.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let (_dir, config) = write_config("[node]\npattern = \"{{count\"\n");
        let result = validate_config(&ValidateArgs {
            config,
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.is_some());
    }
}
