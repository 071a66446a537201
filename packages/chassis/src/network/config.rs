//! Network configuration types for the chassis.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ChassisError, Result};

/// Listen address, TLS material paths, and request timeout.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Path to the TLS certificate file, if serving TLS.
    pub cert_path: Option<PathBuf>,
    /// Path to the TLS private key file, if serving TLS.
    pub key_path: Option<PathBuf>,
    /// Optional path to a CA certificate, carried for embedding services.
    pub ca_path: Option<PathBuf>,
    /// Maximum time to wait for a request to complete.
    pub request_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cert_path: None,
            key_path: None,
            ca_path: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl NetworkConfig {
    /// Returns the `host:port` listen address.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Assembles the TLS configuration from the material paths.
    ///
    /// Returns `None` when no TLS material is configured.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when only one of the certificate and
    /// key paths is set.
    pub fn tls_config(&self) -> Result<Option<TlsConfig>> {
        match (&self.cert_path, &self.key_path) {
            (Some(cert), Some(key)) => Ok(Some(TlsConfig {
                cert_path: cert.clone(),
                key_path: key.clone(),
                ca_cert_path: self.ca_path.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(ChassisError::config(
                "TLS requires both a certificate and a key path",
            )),
        }
    }
}

/// TLS certificate configuration.
///
/// No `Default` impl because certificate paths have no sensible defaults.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file.
    pub cert_path: PathBuf,
    /// Path to the TLS private key file.
    pub key_path: PathBuf,
    /// Optional path to a CA certificate for client verification.
    pub ca_cert_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.cert_path.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn listen_addr_joins_host_and_port() {
        let config = NetworkConfig {
            host: "127.0.0.1".to_string(),
            port: 9191,
            ..NetworkConfig::default()
        };
        assert_eq!(config.listen_addr(), "127.0.0.1:9191");
    }

    #[test]
    fn tls_config_absent_without_material() {
        let config = NetworkConfig::default();
        assert!(config.tls_config().unwrap().is_none());
    }

    #[test]
    fn tls_config_assembled_from_cert_and_key() {
        let config = NetworkConfig {
            cert_path: Some(PathBuf::from("/tmp/cert.pem")),
            key_path: Some(PathBuf::from("/tmp/key.pem")),
            ca_path: Some(PathBuf::from("/tmp/ca.pem")),
            ..NetworkConfig::default()
        };
        let tls = config.tls_config().unwrap().unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/tmp/cert.pem"));
        assert_eq!(tls.key_path, PathBuf::from("/tmp/key.pem"));
        assert_eq!(tls.ca_cert_path, Some(PathBuf::from("/tmp/ca.pem")));
    }

    #[test]
    fn cert_without_key_is_a_configuration_error() {
        let config = NetworkConfig {
            cert_path: Some(PathBuf::from("/tmp/cert.pem")),
            ..NetworkConfig::default()
        };
        let err = config.tls_config().unwrap_err();
        assert!(err.to_string().contains("certificate and a key"));
    }
}
