//! Configuration commands.

use crate::config::{ClientConfig, EffectiveConfig, LOCAL_SETTINGS_FILE};
use crate::error::{ClientError, ClientResult};

/// Dump the effective configuration to stdout, secrets redacted.
pub fn dump(config: &EffectiveConfig) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(&config.to_redacted_file())
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;

    if config.sources.is_empty() {
        println!("# no configuration files found, flags and environment only");
    }
    for source in &config.sources {
        println!("# {}", source.display());
    }
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration, resolving secret references but without
/// contacting any service.
pub fn validate(config: &EffectiveConfig) -> ClientResult<()> {
    let settings = config
        .graph
        .to_provider_settings()
        .map_err(ClientError::Config)?;

    println!("Token endpoint: {}", settings.credentials.token_url()?);
    println!("Batch endpoint: {}", settings.graph.batch_url());
    println!(
        "Will create {} events in batches of {}.",
        config.run.count(),
        config.run.batch_size()
    );
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file paths.
pub fn path() -> ClientResult<()> {
    println!("config: {}", ClientConfig::default_path().display());
    let local = std::env::current_dir()?.join(LOCAL_SETTINGS_FILE);
    println!("local:  {}", local.display());
    Ok(())
}
