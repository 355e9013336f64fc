use std::fmt;
use std::path::Path;

use base64ct::{Base64, Encoding};
use p12_keystore::KeyStore;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use x509_cert::Certificate;
use x509_cert::der::{Decode, DecodePem, Encode};

use super::SigningError;

/// Private key and certificate used to sign documents.
///
/// Loaded once and shared read-only (typically behind an `Arc`).
pub struct SigningCredentials {
    key: RsaPrivateKey,
    certificate: Certificate,
    certificate_der: Vec<u8>,
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("subject", &self.subject())
            .finish_non_exhaustive()
    }
}

fn credentials_error(context: &str, e: impl fmt::Display) -> SigningError {
    SigningError::Credentials(format!("{context}: {e}"))
}

impl SigningCredentials {
    /// Load from a password-protected PKCS#12 (`.p12`/`.pfx`) container.
    pub fn from_pkcs12(data: &[u8], password: &str) -> Result<Self, SigningError> {
        let keystore = KeyStore::from_pkcs12(data, password)
            .map_err(|e| credentials_error("PKCS#12 parse error", e))?;
        let (_, chain) = keystore
            .private_key_chain()
            .ok_or_else(|| SigningError::Credentials("PKCS#12 has no private key".into()))?;
        let key = RsaPrivateKey::from_pkcs8_der(chain.key())
            .map_err(|e| credentials_error("private key parse error", e))?;
        let leaf = chain
            .chain()
            .first()
            .ok_or_else(|| SigningError::Credentials("PKCS#12 has no certificate".into()))?;
        Self::from_parts(key, leaf.as_der())
    }

    pub fn from_pkcs12_file(path: impl AsRef<Path>, password: &str) -> Result<Self, SigningError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| credentials_error(&format!("cannot read {}", path.display()), e))?;
        Self::from_pkcs12(&data, password)
    }

    /// Load from a PEM certificate and a PEM private key (PKCS#8 or PKCS#1).
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self, SigningError> {
        let key = RsaPrivateKey::from_pkcs8_pem(key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(key_pem))
            .map_err(|e| credentials_error("private key parse error", e))?;
        let certificate = Certificate::from_pem(cert_pem.as_bytes())
            .map_err(|e| credentials_error("certificate parse error", e))?;
        let der = certificate
            .to_der()
            .map_err(|e| credentials_error("certificate encode error", e))?;
        Self::from_parts(key, &der)
    }

    pub fn from_pem_files(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self, SigningError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path)
                .map_err(|e| credentials_error(&format!("cannot read {}", path.display()), e))
        };
        let cert = read(cert_path.as_ref())?;
        let key = read(key_path.as_ref())?;
        Self::from_pem(&cert, &key)
    }

    fn from_parts(key: RsaPrivateKey, certificate_der: &[u8]) -> Result<Self, SigningError> {
        let certificate = Certificate::from_der(certificate_der)
            .map_err(|e| credentials_error("certificate parse error", e))?;
        let public = certificate_public_key(&certificate)?;
        if public != RsaPublicKey::from(&key) {
            return Err(SigningError::Credentials(
                "private key does not match the certificate".into(),
            ));
        }
        Ok(Self {
            key,
            certificate,
            certificate_der: certificate_der.to_vec(),
        })
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// DER certificate, base64-encoded for `ds:X509Certificate`.
    pub fn certificate_base64(&self) -> String {
        Base64::encode_string(&self.certificate_der)
    }

    /// Certificate subject distinguished name.
    pub fn subject(&self) -> String {
        self.certificate.tbs_certificate.subject.to_string()
    }
}

/// Extract the RSA public key from a certificate.
pub(crate) fn certificate_public_key(certificate: &Certificate) -> Result<RsaPublicKey, SigningError> {
    let spki = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| credentials_error("public key encode error", e))?;
    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| credentials_error("certificate does not hold an RSA key", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT: &str = include_str!("../../tests/fixtures/signing-cert.pem");
    const KEY: &str = include_str!("../../tests/fixtures/signing-key.pem");

    #[test]
    fn loads_pem_pair() {
        let creds = SigningCredentials::from_pem(CERT, KEY).unwrap();
        assert!(creds.subject().contains("20100066603"));
        assert!(!creds.certificate_base64().is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            SigningCredentials::from_pem("not a cert", KEY),
            Err(SigningError::Credentials(_))
        ));
        assert!(matches!(
            SigningCredentials::from_pem(CERT, "not a key"),
            Err(SigningError::Credentials(_))
        ));
    }
}
