//! `warden check` command implementation.

use anyhow::Result;
use std::path::Path;
use warden_core::{ConfigError, WardenConfig};

/// What a successful check found.
#[derive(Debug)]
pub struct CheckReport {
    pub environments: Vec<String>,
    pub default_environment: Option<String>,
    pub unresolved_secrets: Vec<String>,
}

impl CheckReport {
    fn from_config(config: &WardenConfig) -> Self {
        Self {
            environments: config.environments.iter().map(|e| e.name.clone()).collect(),
            default_environment: config.default_environment.clone(),
            unresolved_secrets: config.unresolved_secrets.clone(),
        }
    }

    fn print(&self) {
        println!("Environments ({}):", self.environments.len());
        for name in &self.environments {
            let marker = if self.default_environment.as_deref() == Some(name) {
                " (default)"
            } else {
                ""
            };
            println!("  - {}{}", name, marker);
        }

        if self.unresolved_secrets.is_empty() {
            println!("\n✅ Configuration is valid.");
        } else {
            println!("\n⚠️  Unresolved secrets ({}):", self.unresolved_secrets.len());
            for name in &self.unresolved_secrets {
                println!("  - {}", name);
            }
            println!("\nConfiguration is valid, but connections using these secrets will fail.");
        }
    }
}

pub fn check(path: &Path) -> Result<CheckReport> {
    match WardenConfig::from_file(path) {
        Ok(config) => Ok(CheckReport::from_config(&config)),
        Err(ConfigError::Invalid(problems)) => {
            eprintln!("❌ Errors ({}):", problems.len());
            for problem in &problems {
                eprintln!("  - {}", problem);
            }
            anyhow::bail!("configuration {} is invalid", path.display())
        }
        Err(err) => Err(anyhow::Error::new(err)
            .context(format!("failed to load configuration from {}", path.display()))),
    }
}

pub fn run(path: &Path) -> Result<()> {
    println!("🔍 Checking {}...\n", path.display());
    check(path)?.print();
    Ok(())
}
