use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - The api_key method has at least one token
/// - An enabled IRC relay has an address and a channel name
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey && config.auth.tokens.is_empty() {
        return Err(ConfigError::ValidationError(
            "auth.tokens must not be empty when method = \"api_key\"".to_string(),
        ));
    }

    if config.irc.enabled {
        if config.irc.relay_addr.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::ValidationError(
                "irc.relay_addr is required when irc.enabled = true".to_string(),
            ));
        }
        if !config.irc.mod_channel.starts_with('#') {
            return Err(ConfigError::ValidationError(format!(
                "irc.mod_channel must start with '#': {}",
                config.irc.mod_channel
            )));
        }
    }

    Ok(())
}
