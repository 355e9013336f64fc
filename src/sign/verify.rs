use base64ct::{Base64, Encoding};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use sha2::{Digest, Sha256};
use x509_cert::Certificate;
use x509_cert::der::Decode;

use super::algorithms::{ENVELOPED_SIGNATURE, EXC_C14N, RSA_SHA256, SHA256};
use super::credentials::certificate_public_key;
use super::{SigningError, c14n};
use crate::ubl::{SIGNATURE_ID, ubl_ns};

/// Facts established by a successful [`verify_signed_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSignature {
    /// Base64 SHA-256 digest of the canonical document.
    pub digest: String,
    /// Subject of the embedded signing certificate.
    pub certificate_subject: String,
}

#[derive(Default)]
struct SignatureParts {
    count: usize,
    placed_in_extension: bool,
    id: Option<String>,
    canonicalization: Option<String>,
    method: Option<String>,
    references: usize,
    reference_uri: Option<String>,
    transforms: Vec<String>,
    digest_method: Option<String>,
    digest: Option<String>,
    value: Option<String>,
    certificate: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    Digest,
    Value,
    Certificate,
}

fn failed(message: impl Into<String>) -> SigningError {
    SigningError::Verification(message.into())
}

fn is_bound(ns: &ResolveResult<'_>, uri: &str) -> bool {
    matches!(ns, ResolveResult::Bound(bound) if bound.as_ref() == uri.as_bytes())
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Verify the enveloped signature of a signed UBL document.
///
/// Checks that exactly one `ds:Signature` sits inside `ext:ExtensionContent`
/// with a single same-document reference (`URI=""`, enveloped-signature then
/// exclusive c14n, SHA-256), that the reference digest matches the canonical
/// document and that the signature value verifies against the embedded
/// certificate.
pub fn verify_signed_document(xml: &str) -> Result<VerifiedSignature, SigningError> {
    let parts = collect_parts(xml)?;

    match parts.count {
        0 => return Err(failed("document has no ds:Signature")),
        1 => {}
        n => return Err(failed(format!("document has {n} ds:Signature elements"))),
    }
    if !parts.placed_in_extension {
        return Err(failed("ds:Signature is not inside ext:ExtensionContent"));
    }
    if parts.id.as_deref() != Some(SIGNATURE_ID) {
        return Err(failed(format!("ds:Signature Id must be {SIGNATURE_ID}")));
    }
    if parts.canonicalization.as_deref() != Some(EXC_C14N) {
        return Err(failed("unsupported canonicalization method"));
    }
    if parts.method.as_deref() != Some(RSA_SHA256) {
        return Err(failed("unsupported signature method"));
    }
    if parts.references != 1 {
        return Err(failed(format!(
            "expected one ds:Reference, found {}",
            parts.references
        )));
    }
    if parts.reference_uri.as_deref() != Some("") {
        return Err(failed("ds:Reference must cover the whole document (URI=\"\")"));
    }
    if parts.transforms != [ENVELOPED_SIGNATURE, EXC_C14N] {
        return Err(failed(
            "ds:Transforms must be enveloped-signature followed by exclusive c14n",
        ));
    }
    if parts.digest_method.as_deref() != Some(SHA256) {
        return Err(failed("unsupported digest method"));
    }

    let expected_digest = parts.digest.ok_or_else(|| failed("missing ds:DigestValue"))?;
    let canonical = c14n::canonicalize_enveloped(xml)?;
    let digest = Base64::encode_string(&Sha256::digest(canonical.as_bytes()));
    if digest != expected_digest {
        return Err(failed("digest mismatch"));
    }

    let certificate_b64 = parts
        .certificate
        .ok_or_else(|| failed("missing ds:X509Certificate"))?;
    let certificate_der = Base64::decode_vec(&certificate_b64)
        .map_err(|e| failed(format!("certificate is not base64: {e}")))?;
    let certificate = Certificate::from_der(&certificate_der)
        .map_err(|e| failed(format!("certificate parse error: {e}")))?;
    let public_key = certificate_public_key(&certificate)?;

    let value_b64 = parts.value.ok_or_else(|| failed("missing ds:SignatureValue"))?;
    let value = Base64::decode_vec(&value_b64)
        .map_err(|e| failed(format!("signature value is not base64: {e}")))?;
    let signature =
        Signature::try_from(value.as_slice()).map_err(|e| failed(e.to_string()))?;

    let signed_info = c14n::canonicalize_element(xml, ubl_ns::DS, "SignedInfo")?;
    VerifyingKey::<Sha256>::new(public_key)
        .verify(signed_info.as_bytes(), &signature)
        .map_err(|_| failed("signature value does not verify"))?;

    Ok(VerifiedSignature {
        digest,
        certificate_subject: certificate.tbs_certificate.subject.to_string(),
    })
}

fn collect_parts(xml: &str) -> Result<SignatureParts, SigningError> {
    let mut reader = NsReader::from_str(xml);
    let mut parts = SignatureParts::default();
    // (is ext:ExtensionContent) for each open element
    let mut stack: Vec<bool> = Vec::new();
    let mut capture: Option<(Capture, String)> = None;

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| failed(format!("malformed XML: {e}")))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_start = matches!(event, Event::Start(_));
                let local = e.local_name();
                let local = local.as_ref();
                let ds = is_bound(&ns, ubl_ns::DS);

                if ds && local == b"Signature" {
                    parts.count += 1;
                    parts.placed_in_extension = stack.last().copied().unwrap_or(false);
                    parts.id = attribute(e, b"Id");
                }
                if ds && parts.count == 1 {
                    match local {
                        b"CanonicalizationMethod" => {
                            parts.canonicalization = attribute(e, b"Algorithm");
                        }
                        b"SignatureMethod" => parts.method = attribute(e, b"Algorithm"),
                        b"Reference" => {
                            parts.references += 1;
                            parts.reference_uri = attribute(e, b"URI");
                        }
                        b"Transform" => parts
                            .transforms
                            .push(attribute(e, b"Algorithm").unwrap_or_default()),
                        b"DigestMethod" => parts.digest_method = attribute(e, b"Algorithm"),
                        b"DigestValue" if parts.digest.is_none() => {
                            capture = Some((Capture::Digest, String::new()));
                        }
                        b"SignatureValue" if parts.value.is_none() => {
                            capture = Some((Capture::Value, String::new()));
                        }
                        b"X509Certificate" if parts.certificate.is_none() => {
                            capture = Some((Capture::Certificate, String::new()));
                        }
                        _ => {}
                    }
                }

                if is_start {
                    stack.push(is_bound(&ns, ubl_ns::EXT) && local == b"ExtensionContent");
                } else if let Some((kind, text)) = capture.take() {
                    store(&mut parts, kind, text);
                }
            }
            Event::Text(ref t) => {
                if let Some((_, text)) = capture.as_mut() {
                    let raw = t.unescape().map_err(|e| failed(e.to_string()))?;
                    text.push_str(&raw);
                }
            }
            Event::End(_) => {
                stack.pop();
                if let Some((kind, text)) = capture.take() {
                    store(&mut parts, kind, text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parts)
}

fn store(parts: &mut SignatureParts, kind: Capture, text: String) {
    let text = strip_whitespace(&text);
    match kind {
        Capture::Digest => parts.digest = Some(text),
        Capture::Value => parts.value = Some(text),
        Capture::Certificate => parts.certificate = Some(text),
    }
}
