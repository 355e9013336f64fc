use std::ops::Range;
use std::sync::Arc;

use base64ct::{Base64, Encoding};
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::{Digest, Sha256};

use super::algorithms::{ENVELOPED_SIGNATURE, EXC_C14N, RSA_SHA256, SHA256};
use super::{DocumentSigner, SigningCredentials, SigningError, c14n};
use crate::core::CpeError;
use crate::ubl::xml_utils::XmlWriter;
use crate::ubl::{SIGNATURE_ID, ubl_ns};

/// Enveloped XMLDSig signer (RSA-SHA256 over exclusive c14n).
#[derive(Debug, Clone)]
pub struct XmlDsigSigner {
    credentials: Arc<SigningCredentials>,
}

impl XmlDsigSigner {
    pub fn new(credentials: Arc<SigningCredentials>) -> Self {
        Self { credentials }
    }
}

impl DocumentSigner for XmlDsigSigner {
    fn sign(&self, xml: &str) -> Result<String, SigningError> {
        let placeholder = find_placeholder(xml)?;

        // Normalize the placeholder to an empty start/end pair so the
        // digested form and the final document agree.
        let unsigned = splice(xml, placeholder.clone(), "");
        let canonical = c14n::canonicalize_enveloped(&unsigned)?;
        let digest = Base64::encode_string(&Sha256::digest(canonical.as_bytes()));

        let mut standalone = XmlWriter::fragment();
        write_signed_info(&mut standalone, &digest, true).map_err(markup)?;
        let canonical_info = c14n::canonicalize(&standalone.into_string().map_err(markup)?)?;
        let signing_key = SigningKey::<Sha256>::new(self.credentials.private_key().clone());
        let signature = signing_key
            .try_sign(canonical_info.as_bytes())
            .map_err(|e| SigningError::Crypto(e.to_string()))?;
        let signature_value = Base64::encode_string(&signature.to_bytes());

        let element = signature_element(
            &digest,
            &signature_value,
            &self.credentials.certificate_base64(),
        )
        .map_err(markup)?;

        tracing::debug!(digest = %digest, "document signed");
        Ok(splice(xml, placeholder, &element))
    }
}

fn markup(e: CpeError) -> SigningError {
    SigningError::Markup(e.to_string())
}

fn algorithm(w: &mut XmlWriter, name: &str, uri: &str) -> Result<(), CpeError> {
    w.start_element_with_attrs(name, &[("Algorithm", uri)])?
        .end_element(name)?;
    Ok(())
}

/// Write `ds:SignedInfo`. The standalone form declares the `ds` prefix so
/// it canonicalizes identically to the embedded form under `ds:Signature`.
fn write_signed_info(w: &mut XmlWriter, digest: &str, standalone: bool) -> Result<(), CpeError> {
    if standalone {
        w.start_element_with_attrs("ds:SignedInfo", &[("xmlns:ds", ubl_ns::DS)])?;
    } else {
        w.start_element("ds:SignedInfo")?;
    }
    algorithm(w, "ds:CanonicalizationMethod", EXC_C14N)?;
    algorithm(w, "ds:SignatureMethod", RSA_SHA256)?;
    w.start_element_with_attrs("ds:Reference", &[("URI", "")])?
        .start_element("ds:Transforms")?;
    algorithm(w, "ds:Transform", ENVELOPED_SIGNATURE)?;
    algorithm(w, "ds:Transform", EXC_C14N)?;
    w.end_element("ds:Transforms")?;
    algorithm(w, "ds:DigestMethod", SHA256)?;
    w.text_element("ds:DigestValue", digest)?
        .end_element("ds:Reference")?
        .end_element("ds:SignedInfo")?;
    Ok(())
}

fn signature_element(
    digest: &str,
    signature_value: &str,
    certificate: &str,
) -> Result<String, CpeError> {
    let mut w = XmlWriter::fragment();
    w.start_element_with_attrs(
        "ds:Signature",
        &[("xmlns:ds", ubl_ns::DS), ("Id", SIGNATURE_ID)],
    )?;
    write_signed_info(&mut w, digest, false)?;
    w.text_element("ds:SignatureValue", signature_value)?
        .start_element("ds:KeyInfo")?
        .start_element("ds:X509Data")?
        .text_element("ds:X509Certificate", certificate)?
        .end_element("ds:X509Data")?
        .end_element("ds:KeyInfo")?
        .end_element("ds:Signature")?;
    w.into_string()
}

fn splice(xml: &str, range: Range<usize>, content: &str) -> String {
    let mut out = String::with_capacity(xml.len() + content.len() + 48);
    out.push_str(&xml[..range.start]);
    out.push_str("<ext:ExtensionContent>");
    out.push_str(content);
    out.push_str("</ext:ExtensionContent>");
    out.push_str(&xml[range.end..]);
    out
}

fn is_bound(ns: &ResolveResult<'_>, uri: &str) -> bool {
    matches!(ns, ResolveResult::Bound(bound) if bound.as_ref() == uri.as_bytes())
}

/// Locate the single empty `ext:ExtensionContent` element.
///
/// Returns its byte range in `xml`, from `<` of the start tag to the end of
/// the closing tag.
fn find_placeholder(xml: &str) -> Result<Range<usize>, SigningError> {
    let mut reader = NsReader::from_str(xml);
    let mut candidates: Vec<Range<usize>> = Vec::new();
    // Start offset of the open ExtensionContent and whether it is still empty.
    let mut open: Option<(usize, bool)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| SigningError::Placeholder(format!("malformed XML: {e}")))?;
        let after = reader.buffer_position() as usize;
        let ns = match &event {
            Event::Start(e) | Event::Empty(e) => reader.resolve_element(e.name()).0,
            Event::End(e) => reader.resolve_element(e.name()).0,
            _ => ResolveResult::Unbound,
        };

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let local = e.local_name();
                let is_empty_tag = matches!(event, Event::Empty(_));
                if is_bound(&ns, ubl_ns::DS) && local.as_ref() == b"Signature" {
                    return Err(SigningError::AlreadySigned);
                }
                if let Some((_, empty)) = open.as_mut() {
                    *empty = false;
                } else if is_bound(&ns, ubl_ns::EXT) && local.as_ref() == b"ExtensionContent" {
                    if is_empty_tag {
                        candidates.push(before..after);
                    } else {
                        open = Some((before, true));
                    }
                }
            }
            Event::Text(ref t) => {
                if let Some((_, empty)) = open.as_mut() {
                    if !t.iter().all(u8::is_ascii_whitespace) {
                        *empty = false;
                    }
                }
            }
            Event::CData(_) => {
                if let Some((_, empty)) = open.as_mut() {
                    *empty = false;
                }
            }
            Event::End(ref e) => {
                if is_bound(&ns, ubl_ns::EXT) && e.local_name().as_ref() == b"ExtensionContent" {
                    if let Some((start, empty)) = open.take() {
                        if empty {
                            candidates.push(start..after);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match candidates.len() {
        0 => Err(SigningError::Placeholder(
            "no empty ext:ExtensionContent element".into(),
        )),
        1 => Ok(candidates.remove(0)),
        n => Err(SigningError::Placeholder(format!(
            "{n} empty ext:ExtensionContent elements"
        ))),
    }
}
