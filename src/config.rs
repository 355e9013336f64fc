//! Runtime configuration for the submission pipeline.
//!
//! Defaults target SUNAT's beta environment with its public test
//! credentials. [`Config::from_env`] overrides any field from `SUNAT_*`
//! environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::sign::{DocumentSigner, NoopSigner, SigningCredentials, SigningError, XmlDsigSigner};
use crate::sunat::{DEFAULT_TIMEOUT, Environment, ProtocolError, SoapClient, SolCredentials};

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    #[error("missing {0}")]
    MissingVar(&'static str),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("cannot create SOAP client: {0}")]
    Client(#[from] ProtocolError),
}

/// How documents are signed before packaging.
#[derive(Clone, Default)]
pub enum SigningMode {
    /// Documents are sent as built.
    #[default]
    None,
    /// XMLDSig with key material from a PKCS#12 container.
    Pkcs12 { path: PathBuf, password: SecretString },
    /// XMLDSig with PEM certificate and private key files.
    Pem { cert_path: PathBuf, key_path: PathBuf },
}

impl std::fmt::Debug for SigningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningMode::None => f.write_str("None"),
            SigningMode::Pkcs12 { path, .. } => f
                .debug_struct("Pkcs12")
                .field("path", path)
                .finish_non_exhaustive(),
            SigningMode::Pem {
                cert_path,
                key_path,
            } => f
                .debug_struct("Pem")
                .field("cert_path", cert_path)
                .field("key_path", key_path)
                .finish(),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Overrides the environment's `billService` URL.
    pub endpoint: Option<String>,
    pub credentials: SolCredentials,
    pub http_timeout: Duration,
    /// Upper bound of concurrent remote calls in bulk operations.
    pub max_concurrency: usize,
    /// Minimum spacing between calls to the endpoint.
    pub min_request_interval: Duration,
    /// Attempts per send when the transport fails.
    pub retry_attempts: u32,
    /// Base of the exponential backoff between attempts.
    pub retry_backoff: Duration,
    pub xml_dir: PathBuf,
    pub zip_dir: PathBuf,
    /// Root under which receipts are kept (in `cdr/`).
    pub receipt_dir: PathBuf,
    pub signing: SigningMode,
    /// Route boletas through `sendSummary` instead of `sendBill`.
    pub receipts_via_summary: bool,
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Beta,
            endpoint: None,
            credentials: SolCredentials::beta_test(),
            http_timeout: DEFAULT_TIMEOUT,
            max_concurrency: 4,
            min_request_interval: Duration::from_millis(200),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(500),
            xml_dir: PathBuf::from("media/xml"),
            zip_dir: PathBuf::from("media/zip"),
            receipt_dir: PathBuf::from("media"),
            signing: SigningMode::None,
            receipts_via_summary: false,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        name,
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidVar {
            name,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

impl Config {
    /// Read configuration from `SUNAT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `SUNAT_ENV` | `environment` (`beta`, `production`) |
    /// | `SUNAT_ENDPOINT` | `endpoint` |
    /// | `SUNAT_RUC`, `SUNAT_SOL_USER`, `SUNAT_SOL_PASSWORD` | `credentials` |
    /// | `SUNAT_TIMEOUT_SECS` | `http_timeout` |
    /// | `SUNAT_MAX_CONCURRENCY` | `max_concurrency` |
    /// | `SUNAT_MIN_INTERVAL_MS` | `min_request_interval` |
    /// | `SUNAT_RETRY_ATTEMPTS`, `SUNAT_RETRY_BACKOFF_MS` | retries |
    /// | `SUNAT_XML_DIR`, `SUNAT_ZIP_DIR`, `SUNAT_RECEIPT_DIR` | output directories |
    /// | `SUNAT_SIGNING` | `none`, `pkcs12` or `pem` |
    /// | `SUNAT_CERT_PATH`, `SUNAT_CERT_PASSWORD`, `SUNAT_KEY_PATH` | key material |
    /// | `SUNAT_RECEIPTS_VIA_SUMMARY` | `receipts_via_summary` |
    /// | `SUNAT_SWEEP_INTERVAL_SECS` | `sweep_interval` |
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(v) = var("SUNAT_ENV") {
            config.environment = parse("SUNAT_ENV", &v)?;
        }
        config.endpoint = var("SUNAT_ENDPOINT");

        let ruc = var("SUNAT_RUC");
        let user = var("SUNAT_SOL_USER");
        let password = var("SUNAT_SOL_PASSWORD");
        match (ruc, user, password) {
            (None, None, None) => {}
            (Some(ruc), Some(user), Some(password)) => {
                config.credentials = SolCredentials::new(ruc, user, password);
            }
            (None, _, _) => return Err(ConfigError::MissingVar("SUNAT_RUC")),
            (_, None, _) => return Err(ConfigError::MissingVar("SUNAT_SOL_USER")),
            (_, _, None) => return Err(ConfigError::MissingVar("SUNAT_SOL_PASSWORD")),
        }

        if let Some(v) = var("SUNAT_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse("SUNAT_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = var("SUNAT_MAX_CONCURRENCY") {
            let n: usize = parse("SUNAT_MAX_CONCURRENCY", &v)?;
            if n == 0 {
                return Err(ConfigError::InvalidVar {
                    name: "SUNAT_MAX_CONCURRENCY",
                    reason: "must be at least 1".into(),
                });
            }
            config.max_concurrency = n;
        }
        if let Some(v) = var("SUNAT_MIN_INTERVAL_MS") {
            config.min_request_interval =
                Duration::from_millis(parse("SUNAT_MIN_INTERVAL_MS", &v)?);
        }
        if let Some(v) = var("SUNAT_RETRY_ATTEMPTS") {
            config.retry_attempts = parse::<u32>("SUNAT_RETRY_ATTEMPTS", &v)?.max(1);
        }
        if let Some(v) = var("SUNAT_RETRY_BACKOFF_MS") {
            config.retry_backoff = Duration::from_millis(parse("SUNAT_RETRY_BACKOFF_MS", &v)?);
        }
        if let Some(v) = var("SUNAT_XML_DIR") {
            config.xml_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SUNAT_ZIP_DIR") {
            config.zip_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SUNAT_RECEIPT_DIR") {
            config.receipt_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SUNAT_RECEIPTS_VIA_SUMMARY") {
            config.receipts_via_summary = parse_bool("SUNAT_RECEIPTS_VIA_SUMMARY", &v)?;
        }
        if let Some(v) = var("SUNAT_SWEEP_INTERVAL_SECS") {
            config.sweep_interval = Duration::from_secs(parse("SUNAT_SWEEP_INTERVAL_SECS", &v)?);
        }

        config.signing = match var("SUNAT_SIGNING").as_deref().map(str::trim) {
            None | Some("none") => SigningMode::None,
            Some("pkcs12") => SigningMode::Pkcs12 {
                path: var("SUNAT_CERT_PATH")
                    .map(PathBuf::from)
                    .ok_or(ConfigError::MissingVar("SUNAT_CERT_PATH"))?,
                password: SecretString::from(
                    var("SUNAT_CERT_PASSWORD")
                        .ok_or(ConfigError::MissingVar("SUNAT_CERT_PASSWORD"))?,
                ),
            },
            Some("pem") => SigningMode::Pem {
                cert_path: var("SUNAT_CERT_PATH")
                    .map(PathBuf::from)
                    .ok_or(ConfigError::MissingVar("SUNAT_CERT_PATH"))?,
                key_path: var("SUNAT_KEY_PATH")
                    .map(PathBuf::from)
                    .ok_or(ConfigError::MissingVar("SUNAT_KEY_PATH"))?,
            },
            Some(other) => {
                return Err(ConfigError::InvalidVar {
                    name: "SUNAT_SIGNING",
                    reason: format!("expected none, pkcs12 or pem, got {other:?}"),
                });
            }
        };

        Ok(config)
    }

    /// Effective `billService` URL.
    pub fn endpoint_url(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.environment.endpoint_url())
    }

    /// Load key material once and return the configured signer.
    pub fn build_signer(&self) -> Result<Arc<dyn DocumentSigner>, ConfigError> {
        let credentials = match &self.signing {
            SigningMode::None => return Ok(Arc::new(NoopSigner)),
            SigningMode::Pkcs12 { path, password } => {
                SigningCredentials::from_pkcs12_file(path, password.expose_secret())?
            }
            SigningMode::Pem {
                cert_path,
                key_path,
            } => SigningCredentials::from_pem_files(cert_path, key_path)?,
        };
        tracing::info!(subject = %credentials.subject(), "signing credentials loaded");
        Ok(Arc::new(XmlDsigSigner::new(Arc::new(credentials))))
    }

    pub fn build_client(&self) -> Result<SoapClient, ConfigError> {
        Ok(SoapClient::new(
            self.endpoint_url(),
            self.credentials.clone(),
            self.http_timeout,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_target_beta() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Beta);
        assert_eq!(config.endpoint_url(), Environment::Beta.endpoint_url());
        assert_eq!(config.credentials.username(), "20000000001MODDATOS");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(matches!(config.signing, SigningMode::None));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SUNAT_ENV", "production"),
            ("SUNAT_ENDPOINT", "http://127.0.0.1:9000/billService"),
            ("SUNAT_RUC", "20100066603"),
            ("SUNAT_SOL_USER", "FACTURA1"),
            ("SUNAT_SOL_PASSWORD", "secreto"),
            ("SUNAT_MAX_CONCURRENCY", "8"),
            ("SUNAT_RETRY_ATTEMPTS", "5"),
            ("SUNAT_RECEIPTS_VIA_SUMMARY", "true"),
            ("SUNAT_SIGNING", "pem"),
            ("SUNAT_CERT_PATH", "cert.pem"),
            ("SUNAT_KEY_PATH", "key.pem"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9000/billService");
        assert_eq!(config.credentials.username(), "20100066603FACTURA1");
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.retry_attempts, 5);
        assert!(config.receipts_via_summary);
        assert!(matches!(config.signing, SigningMode::Pem { .. }));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("SUNAT_ENV", "staging")])),
            Err(ConfigError::InvalidVar { name: "SUNAT_ENV", .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("SUNAT_MAX_CONCURRENCY", "0")])),
            Err(ConfigError::InvalidVar { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("SUNAT_RUC", "20100066603")])),
            Err(ConfigError::MissingVar("SUNAT_SOL_USER"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("SUNAT_SIGNING", "pkcs12")])),
            Err(ConfigError::MissingVar("SUNAT_CERT_PATH"))
        ));
    }

    #[test]
    fn signer_follows_mode() {
        let config = Config::default();
        assert!(!config.build_signer().unwrap().produces_signature());

        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        let config = Config {
            signing: SigningMode::Pkcs12 {
                path: fixtures.join("signing.p12"),
                password: SecretString::from("prueba123".to_string()),
            },
            ..Config::default()
        };
        assert!(config.build_signer().unwrap().produces_signature());
    }
}
