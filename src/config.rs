use std::collections::HashMap;

use config::{Config as ConfigLib, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub signer: SignerConfig,
}

/// Inputs of the `sri-signer` binary
#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    /// PKCS#12 archive, DER or base64
    pub pkcs12_path: String,
    #[serde(default)]
    pub pkcs12_password: Option<SecretString>,
    /// Expected root tag; detected from the document when absent
    #[serde(default)]
    pub document_type: Option<String>,
    /// Document to sign; read from stdin when absent
    #[serde(default)]
    pub input_path: Option<String>,
    /// Where to write the signed document; stdout when absent
    #[serde(default)]
    pub output_path: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(env_vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("signer.pkcs12_path", "config/certificate.p12")?
            .add_source(File::with_name("config/settings").required(false));

        // Explicit sources replace the process environment so tests stay isolated
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // e.g. APP_SIGNER__PKCS12_PATH or APP_SIGNER__PKCS12_PASSWORD
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_config() {
        let config = Config::load_with_sources(Some(HashMap::new())).expect("Failed to load config");

        assert_eq!(config.signer.pkcs12_path, "config/certificate.p12");
        assert!(config.signer.pkcs12_password.is_none());
        assert!(config.signer.document_type.is_none());
        assert!(config.signer.input_path.is_none());
        assert!(config.signer.output_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut env_vars = HashMap::new();
        env_vars.insert("signer.pkcs12_path".to_string(), "/secrets/firma.p12".to_string());
        env_vars.insert("signer.pkcs12_password".to_string(), "s3cret".to_string());
        env_vars.insert("signer.document_type".to_string(), "factura".to_string());
        env_vars.insert("signer.input_path".to_string(), "factura.xml".to_string());

        let config = Config::load_with_sources(Some(env_vars)).expect("Failed to load config");

        assert_eq!(config.signer.pkcs12_path, "/secrets/firma.p12");
        assert_eq!(
            config.signer.pkcs12_password.as_ref().map(|p| p.expose_secret()),
            Some("s3cret")
        );
        assert_eq!(config.signer.document_type.as_deref(), Some("factura"));
        assert_eq!(config.signer.input_path.as_deref(), Some("factura.xml"));
        assert!(config.signer.output_path.is_none());
    }

    #[test]
    fn test_password_is_redacted_in_debug_output() {
        let mut env_vars = HashMap::new();
        env_vars.insert("signer.pkcs12_password".to_string(), "s3cret".to_string());

        let config = Config::load_with_sources(Some(env_vars)).expect("Failed to load config");
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
