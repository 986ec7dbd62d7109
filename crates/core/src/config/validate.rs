use super::{
    types::{AuthMethod, Config, MailTransportKind},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - An api key is present when api_key auth is selected
/// - The From address is not empty
/// - SMTP transport has an [mail.smtp] section with a host
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().is_none_or(str::is_empty)
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if config.mail.from_address.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "mail.from_address cannot be empty".to_string(),
        ));
    }

    if config.mail.transport == MailTransportKind::Smtp {
        match &config.mail.smtp {
            Some(smtp) if !smtp.host.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::ValidationError(
                    "mail.smtp.host is required when mail.transport = \"smtp\"".to_string(),
                ))
            }
        }
    }

    Ok(())
}
