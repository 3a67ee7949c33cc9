//! Config show/check command handlers.

use anyhow::{Context, Result};

use muster::config::validate::{validate_config, validate_values, DiagnosticLevel};
use muster::config::Config;

use super::ConfigAction;

pub(crate) async fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load().context("Failed to load config")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Check => cmd_check()?,
    }
    Ok(())
}

/// Validate configuration file.
fn cmd_check() -> Result<()> {
    let config_path = Config::path();
    println!("Config file: {}", config_path.display());

    if !config_path.exists() {
        println!("[OK] No config file found (using defaults)");
        return Ok(());
    }

    let content = std::fs::read_to_string(&config_path).context("Failed to read config file")?;

    let raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            println!("[ERROR] Invalid JSON: {}", e);
            return Ok(());
        }
    };

    let diagnostics = validate_config(&raw);
    for diag in &diagnostics {
        println!("{}", diag);
    }

    let mut errors = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warn)
        .count();

    match serde_json::from_value::<Config>(raw) {
        Ok(config) => {
            for problem in validate_values(&config) {
                println!("[ERROR] {}", problem);
                errors += 1;
            }
        }
        Err(e) => {
            println!("[ERROR] Invalid value: {}", e);
            errors += 1;
        }
    }

    if errors == 0 && warnings == 0 {
        println!("\nConfiguration looks good!");
    } else {
        println!("\nFound {} error(s), {} warning(s)", errors, warnings);
    }
    Ok(())
}
