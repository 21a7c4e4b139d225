//! Shared utility functions used across command modules.

use std::sync::Arc;

use dovequota_core::{
    ConfigError, ConfigManager, QuotaConfig, QuotaSnapshot, RemoteQuotaClient, SshQuotaClient,
};
use secrecy::SecretString;

use crate::cli::Overrides;
use crate::error::CliError;

/// Creates a `ConfigManager` for the `--config` path or the default location
pub fn create_config_manager(overrides: &Overrides) -> Result<ConfigManager, CliError> {
    match overrides.config {
        Some(ref path) => Ok(ConfigManager::with_config_file(path)),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads the configuration and applies flag and environment overrides.
///
/// A missing file is accepted when both `--host` and `--user` are given.
pub fn load_config(overrides: &Overrides) -> Result<QuotaConfig, CliError> {
    let manager = create_config_manager(overrides)?;

    let mut config = match manager.load() {
        Ok(config) => config,
        Err(ConfigError::NotFound(path)) => match (&overrides.host, &overrides.user) {
            (Some(host), Some(user)) => {
                tracing::debug!(path = %path.display(), "No configuration file, using flags");
                QuotaConfig::new(host, user)
            }
            _ => return Err(ConfigError::NotFound(path).into()),
        },
        Err(e) => return Err(e.into()),
    };

    apply_overrides(&mut config, overrides);
    config.validate()?;

    if overrides.ask_password {
        config.password = Some(prompt_password(&config)?);
    }

    Ok(config)
}

/// Replaces file values with the ones given on the command line
pub fn apply_overrides(config: &mut QuotaConfig, overrides: &Overrides) {
    if let Some(ref host) = overrides.host {
        config.hostname.clone_from(host);
    }
    if let Some(ref user) = overrides.user {
        config.username.clone_from(user);
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(ref identity_file) = overrides.identity_file {
        config.identity_file = Some(identity_file.clone());
    }
}

/// Reads the SSH password from the terminal without echo
fn prompt_password(config: &QuotaConfig) -> Result<SecretString, CliError> {
    let password = rpassword::prompt_password(format!(
        "Password for {}@{}: ",
        config.username, config.hostname
    ))?;
    Ok(SecretString::from(password))
}

/// Builds the SSH client for the configured server
pub fn create_client(config: &QuotaConfig) -> Result<Arc<dyn RemoteQuotaClient>, CliError> {
    let params = config.connection_parameters()?;
    Ok(Arc::new(SshQuotaClient::new(params)))
}

/// Creates the async runtime used to drive the core library
pub fn create_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Config(format!("Failed to create async runtime: {e}")))
}

/// Accounts to report: the configured selection, or everything on the server
/// when `all` is set or nothing is selected
pub fn selected_accounts(config: &QuotaConfig, snapshot: &QuotaSnapshot, all: bool) -> Vec<String> {
    if all || config.accounts.is_empty() {
        snapshot.account_ids().map(str::to_string).collect()
    } else {
        config.accounts.clone()
    }
}
