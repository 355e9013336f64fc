//! XML digital signatures for UBL documents.
//!
//! A [`DocumentSigner`] turns the unsigned XML produced by
//! [`ubl::to_ubl_xml`](crate::ubl::to_ubl_xml) into the signed XML that is
//! packaged and sent. [`XmlDsigSigner`] produces an enveloped RSA-SHA256
//! XMLDSig signature inside the `ext:ExtensionContent` placeholder;
//! [`NoopSigner`] leaves documents untouched for environments that sign
//! elsewhere.
//!
//! ```no_run
//! use std::sync::Arc;
//! use comprobante::sign::{DocumentSigner, SigningCredentials, XmlDsigSigner};
//!
//! let credentials = SigningCredentials::from_pkcs12_file("cert.p12", "secret").unwrap();
//! let signer = XmlDsigSigner::new(Arc::new(credentials));
//! let signed = signer.sign("<Invoice>...</Invoice>").unwrap();
//! ```

pub mod c14n;
mod credentials;
mod dsig;
mod verify;

use thiserror::Error;

use c14n::C14nError;

pub use credentials::SigningCredentials;
pub use dsig::XmlDsigSigner;
pub use verify::{VerifiedSignature, verify_signed_document};

/// Algorithm identifiers used in `ds:SignedInfo`.
pub mod algorithms {
    pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
    pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
    pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
    pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
}

/// Errors raised while loading key material, signing or verifying.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SigningError {
    #[error("cannot load signing credentials: {0}")]
    Credentials(String),

    #[error("signature placeholder: {0}")]
    Placeholder(String),

    #[error("document is already signed")]
    AlreadySigned,

    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] C14nError),

    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    #[error("cannot write signature markup: {0}")]
    Markup(String),

    #[error("signature verification failed: {0}")]
    Verification(String),
}

/// Capability to sign a UBL document.
///
/// Implementations are selected once at startup and shared between tasks.
pub trait DocumentSigner: Send + Sync {
    /// Return the signed form of `xml`.
    fn sign(&self, xml: &str) -> Result<String, SigningError>;

    /// Whether documents returned by [`sign`](Self::sign) carry a `ds:Signature`.
    fn produces_signature(&self) -> bool {
        true
    }
}

/// Signer that returns documents unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSigner;

impl DocumentSigner for NoopSigner {
    fn sign(&self, xml: &str) -> Result<String, SigningError> {
        Ok(xml.to_string())
    }

    fn produces_signature(&self) -> bool {
        false
    }
}
