use tracing::debug;

use crate::config::ProfileConfig;
use crate::error::{BbError, Result};

const DEFAULT_TOKEN_ENV: &str = "BITBUCKET_TOKEN";

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the Basic auth token for a profile, trying:
/// 1. The profile's env var (`BITBUCKET_TOKEN` when unset)
/// 2. The inline `token`
/// 3. The profile's `token_command`
pub fn resolve_token(profile: &ProfileConfig) -> Result<String> {
    let env_var = profile.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
    resolve_with(profile, std::env::var(env_var).ok())
}

fn resolve_with(profile: &ProfileConfig, env_value: Option<String>) -> Result<String> {
    if let Some(token) = non_empty(env_value) {
        debug!(profile = %profile.name, "token from environment");
        return Ok(token);
    }

    if let Some(token) = non_empty(profile.token.clone()) {
        debug!(profile = %profile.name, "token from config");
        return Ok(token);
    }

    if let Some(cmd) = &profile.token_command {
        if let Some(token) = try_cli_token(cmd) {
            debug!(profile = %profile.name, "token from command");
            return Ok(token);
        }
    }

    Err(BbError::Config(format!(
        "No token found for profile '{}'. Set {}, add `token`, or configure a token_command.",
        profile.name,
        profile.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
    )))
}
