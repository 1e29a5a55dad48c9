//! Configuration inspection commands.

use anyhow::{bail, Result};
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::display::{label, list_table};
use crate::cli::output::{output, CommandOutput};
use crate::cli::types::ConfigCommands;
use crate::domain::models::{AgentRole, Config};
use crate::infrastructure::config::ConfigLoader;

const REDACTED: &str = "********";

#[derive(Debug, Serialize)]
pub struct RoleStatus {
    pub role: AgentRole,
    pub provider: String,
    pub model: Option<String>,
    pub problems: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigCheckOutput {
    pub valid: bool,
    pub max_iterations: u32,
    pub roles: Vec<RoleStatus>,
    pub problems: Vec<String>,
}

impl CommandOutput for ConfigCheckOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["role", "provider", "model", "status"]);
        for role in &self.roles {
            let model = role
                .model
                .clone()
                .unwrap_or_else(|| "-".to_string());
            let status = if role.problems.is_empty() {
                "ok".to_string()
            } else {
                format!("{} problem(s)", role.problems.len())
            };
            table.add_row(vec![
                Cell::new(role.role),
                Cell::new(&role.provider),
                Cell::new(model),
                Cell::new(status),
            ]);
        }

        let mut lines = vec![
            format!("{} {}", label("Max iterations"), self.max_iterations),
            table.to_string(),
        ];
        if self.valid {
            lines.push("Configuration is valid.".to_string());
        } else {
            lines.push("Problems:".to_string());
            lines.extend(self.problems.iter().map(|p| format!("  - {p}")));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigShowOutput(pub serde_json::Value);

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.0).unwrap_or_default()
    }
}

pub fn check(config: &Config) -> ConfigCheckOutput {
    let roles = AgentRole::ALL
        .into_iter()
        .map(|role| {
            let resolved = config.resolve_agent(role);
            RoleStatus {
                role,
                provider: resolved.provider.as_str().to_string(),
                model: resolved.model.clone().or(resolved.deployment.clone()),
                problems: resolved.problems(role),
            }
        })
        .collect();
    let problems = ConfigLoader::validation_errors(config);

    ConfigCheckOutput {
        valid: problems.is_empty(),
        max_iterations: config.workflow.max_iterations,
        roles,
        problems,
    }
}

/// The merged configuration with API keys masked.
pub fn redacted(config: &Config) -> serde_json::Value {
    let mut value = serde_json::to_value(config).unwrap_or_default();
    for provider in ["openai", "azure"] {
        if let Some(key) = value
            .pointer_mut(&format!("/llm/{provider}/api_key"))
            .filter(|key| !key.is_null())
        {
            *key = serde_json::Value::String(REDACTED.to_string());
        }
    }
    value
}

pub fn execute(command: ConfigCommands, config: &Config, json_mode: bool) -> Result<()> {
    match command {
        ConfigCommands::Check => {
            let report = check(config);
            output(&report, json_mode);
            if !report.valid {
                bail!("Configuration has {} problem(s)", report.problems.len());
            }
        }
        ConfigCommands::Show => output(&ConfigShowOutput(redacted(config)), json_mode),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ProviderKind;

    #[test]
    fn test_check_reports_missing_credentials() {
        let report = check(&Config::default());
        assert!(!report.valid);
        assert_eq!(report.roles.len(), 4);
        assert!(report.roles.iter().all(|role| !role.problems.is_empty()));
    }

    #[test]
    fn test_check_mock_is_valid() {
        let mut config = Config::default();
        config.llm.provider = ProviderKind::Mock;
        let report = check(&config);
        assert!(report.valid);
        assert!(report.to_human().contains("Configuration is valid."));
    }

    #[test]
    fn test_redacted_masks_keys() {
        let mut config = Config::default();
        config.llm.openai.api_key = Some("sk-secret".to_string());
        let value = redacted(&config);
        assert_eq!(value["llm"]["openai"]["api_key"], REDACTED);
        assert!(value["llm"]["azure"]["api_key"].is_null());
        assert!(!value.to_string().contains("sk-secret"));
    }
}
