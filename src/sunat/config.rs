//! SUNAT environment selection and SOL credentials.
use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// SUNAT `billService` environment.
///
/// - Beta: SUNAT's homologation environment, accepts the public test
///   credentials.
/// - Production: the live service.
///
/// ```rust
/// use std::str::FromStr;
/// use comprobante::sunat::Environment;
///
/// let env = Environment::from_str("production").unwrap();
/// assert_eq!(env, Environment::Production);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Beta,
    Production,
}

/// Error returned when parsing an [`Environment`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentParseError {
    #[error("invalid environment: {input}")]
    Invalid { input: String },
}

impl FromStr for Environment {
    type Err = EnvironmentParseError;

    fn from_str(env: &str) -> Result<Self, Self::Err> {
        match env.trim().to_ascii_lowercase().as_str() {
            "beta" => Ok(Environment::Beta),
            "production" | "produccion" => Ok(Environment::Production),
            _ => Err(EnvironmentParseError::Invalid {
                input: env.to_string(),
            }),
        }
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Beta => "beta",
            Environment::Production => "production",
        }
    }

    pub fn endpoint_url(&self) -> &'static str {
        match self {
            Environment::Beta => "https://e-beta.sunat.gob.pe/ol-ti-itcpfegem-beta/billService",
            Environment::Production => {
                "https://e-factura.sunat.gob.pe/ol-ti-itcpfegem/billService"
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clave SOL credentials used in the WS-Security `UsernameToken`.
#[derive(Clone)]
pub struct SolCredentials {
    ruc: String,
    user: String,
    password: SecretString,
}

impl SolCredentials {
    /// RUC accepted by the beta environment together with the test user.
    pub const TEST_RUC: &'static str = "20000000001";
    pub const TEST_USER: &'static str = "MODDATOS";
    pub const TEST_PASSWORD: &'static str = "MODDATOS";

    pub fn new(ruc: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ruc: ruc.into(),
            user: user.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// SUNAT's public credentials for the beta environment.
    pub fn beta_test() -> Self {
        Self::new(Self::TEST_RUC, Self::TEST_USER, Self::TEST_PASSWORD)
    }

    pub fn ruc(&self) -> &str {
        &self.ruc
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// `UsernameToken` user name: RUC followed by the SOL user.
    pub fn username(&self) -> String {
        format!("{}{}", self.ruc, self.user)
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl Default for SolCredentials {
    fn default() -> Self {
        Self::beta_test()
    }
}

impl fmt::Debug for SolCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolCredentials")
            .field("ruc", &self.ruc)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_environment() {
        assert_eq!(Environment::from_str("BETA").unwrap(), Environment::Beta);
        assert_eq!(
            Environment::from_str(" production ").unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn endpoints_are_https() {
        assert!(Environment::Beta.endpoint_url().starts_with("https://e-beta."));
        assert!(Environment::Production.endpoint_url().starts_with("https://e-factura."));
    }

    #[test]
    fn username_concatenates_ruc_and_user() {
        let creds = SolCredentials::beta_test();
        assert_eq!(creds.username(), "20000000001MODDATOS");
        assert_eq!(creds.password(), "MODDATOS");
    }

    #[test]
    fn debug_redacts_password() {
        let creds = SolCredentials::new("20100066603", "USER", "hunter2");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
    }
}
