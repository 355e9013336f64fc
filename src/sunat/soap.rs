//! SOAP 1.1 envelopes for SUNAT's `billService` and parsing of its replies.

use base64ct::{Base64, Encoding};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SolCredentials;
use crate::core::CpeError;
use crate::ubl::xml_utils::XmlWriter;

pub const SOAPENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SERVICE_NS: &str = "http://service.sunat.gob.pe";
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// `getStatus` code meaning the ticket is still being processed.
pub const STATUS_IN_PROGRESS: &str = "98";

/// Remote operation of `billService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoapMethod {
    SendBill,
    SendSummary,
    GetStatus,
}

impl SoapMethod {
    /// Operation element name inside `soapenv:Body`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SoapMethod::SendBill => "sendBill",
            SoapMethod::SendSummary => "sendSummary",
            SoapMethod::GetStatus => "getStatus",
        }
    }

    pub fn soap_action(&self) -> &'static str {
        match self {
            SoapMethod::SendBill => "urn:sendBill",
            SoapMethod::SendSummary => "urn:sendSummary",
            SoapMethod::GetStatus => "urn:getStatus",
        }
    }
}

/// Errors from a `billService` exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// The service answered with a SOAP fault. Permanent.
    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    /// Timeout, connection failure or non-200 answer without a fault body.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProtocolError {
    /// Only transport failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProtocolError::Transport(_))
    }
}

/// Decoded answer of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillResponse {
    /// Receipt archive (CDR zip), already base64-decoded.
    Receipt(Vec<u8>),
    /// Deferred processing; poll with `getStatus`.
    Ticket(String),
    /// `getStatus` reported the ticket as still in progress.
    Pending { status_code: String },
    /// Recognized response element without receipt or ticket.
    Acknowledged,
}

/// Operation arguments placed under `<ser:{method}>`.
#[derive(Debug, Clone, Copy)]
pub enum SoapPayload<'a> {
    Upload { file_name: &'a str, archive: &'a [u8] },
    Ticket(&'a str),
}

/// Render the request envelope for `method`.
pub fn build_envelope(
    method: SoapMethod,
    credentials: &SolCredentials,
    payload: SoapPayload<'_>,
) -> Result<String, CpeError> {
    let operation = format!("ser:{}", method.as_str());
    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs(
        "soapenv:Envelope",
        &[
            ("xmlns:soapenv", SOAPENV_NS),
            ("xmlns:ser", SERVICE_NS),
            ("xmlns:wsse", WSSE_NS),
        ],
    )?;
    w.start_element("soapenv:Header")?;
    w.start_element("wsse:Security")?;
    w.start_element("wsse:UsernameToken")?;
    w.text_element("wsse:Username", &credentials.username())?;
    w.text_element("wsse:Password", credentials.password())?;
    w.end_element("wsse:UsernameToken")?;
    w.end_element("wsse:Security")?;
    w.end_element("soapenv:Header")?;

    w.start_element("soapenv:Body")?;
    w.start_element(&operation)?;
    match payload {
        SoapPayload::Upload { file_name, archive } => {
            w.text_element("fileName", file_name)?;
            w.text_element("contentFile", &Base64::encode_string(archive))?;
        }
        SoapPayload::Ticket(ticket) => {
            w.text_element("ticket", ticket)?;
        }
    }
    w.end_element(&operation)?;
    w.end_element("soapenv:Body")?;
    w.end_element("soapenv:Envelope")?;
    w.into_string()
}

#[derive(Default)]
struct Fields {
    envelope: bool,
    fault: bool,
    response: bool,
    fault_code: String,
    fault_string: String,
    application_response: String,
    ticket: String,
    status_code: String,
    content: String,
}

/// Classify a `billService` reply body.
pub fn parse_response(body: &str) -> Result<BillResponse, ProtocolError> {
    let fields = scan(body)?;

    if !fields.envelope {
        return Err(ProtocolError::Malformed("missing SOAP envelope".into()));
    }
    if fields.fault {
        return Err(ProtocolError::Fault {
            code: non_empty_or(fields.fault_code, "Unknown"),
            message: non_empty_or(fields.fault_string, "Unknown"),
        });
    }
    if !fields.ticket.is_empty() {
        return Ok(BillResponse::Ticket(fields.ticket));
    }
    if !fields.application_response.is_empty() {
        return decode_archive(&fields.application_response).map(BillResponse::Receipt);
    }
    if !fields.content.is_empty() {
        return decode_archive(&fields.content).map(BillResponse::Receipt);
    }
    if !fields.status_code.is_empty() {
        if fields.status_code == STATUS_IN_PROGRESS {
            return Ok(BillResponse::Pending {
                status_code: fields.status_code,
            });
        }
        return Err(ProtocolError::Fault {
            code: fields.status_code,
            message: "status returned without a receipt".into(),
        });
    }
    if fields.response {
        return Ok(BillResponse::Acknowledged);
    }
    Err(ProtocolError::Malformed(
        "unrecognized SOAP response body".into(),
    ))
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn decode_archive(encoded: &str) -> Result<Vec<u8>, ProtocolError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    Base64::decode_vec(&compact)
        .map_err(|e| ProtocolError::Malformed(format!("receipt is not base64: {e}")))
}

fn scan(body: &str) -> Result<Fields, ProtocolError> {
    let mut reader = Reader::from_str(body);
    let mut fields = Fields::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                mark(&mut fields, &path, &local);
                path.push(local);
            }
            Ok(Event::Empty(e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                mark(&mut fields, &path, &local);
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| ProtocolError::Malformed(e.to_string()))?;
                collect(&mut fields, &path, &text);
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                collect(&mut fields, &path, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ProtocolError::Malformed(format!("invalid XML: {e}"))),
        }
    }
    Ok(fields)
}

fn mark(fields: &mut Fields, path: &[String], local: &str) {
    let parent = path.last().map(String::as_str);
    match (parent, local) {
        (None, "Envelope") => fields.envelope = true,
        (Some("Body"), "Fault") => fields.fault = true,
        (Some("Body"), name) if name.ends_with("Response") => fields.response = true,
        _ => {}
    }
}

fn collect(fields: &mut Fields, path: &[String], text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let n = path.len();
    let current = path.last().map(String::as_str);
    let parent = n.checked_sub(2).map(|i| path[i].as_str());
    let target = match (parent, current) {
        (Some("Fault"), Some("faultcode")) => &mut fields.fault_code,
        (Some("Fault"), Some("faultstring")) => &mut fields.fault_string,
        (_, Some("applicationResponse")) => &mut fields.application_response,
        (_, Some("ticket")) => &mut fields.ticket,
        (Some("status"), Some("statusCode")) => &mut fields.status_code,
        (Some("status"), Some("content")) => &mut fields.content,
        _ => return,
    };
    target.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(body: &str) -> String {
        format!(
            "<soap-env:Envelope xmlns:soap-env=\"{SOAPENV_NS}\"><soap-env:Header/>\
             <soap-env:Body>{body}</soap-env:Body></soap-env:Envelope>"
        )
    }

    #[test]
    fn envelope_carries_username_token_and_payload() {
        let creds = SolCredentials::beta_test();
        let xml = build_envelope(
            SoapMethod::SendBill,
            &creds,
            SoapPayload::Upload {
                file_name: "20000000001-01-F001-00000001.zip",
                archive: b"PK",
            },
        )
        .unwrap();
        assert!(xml.contains("<wsse:Username>20000000001MODDATOS</wsse:Username>"));
        assert!(xml.contains("<wsse:Password>MODDATOS</wsse:Password>"));
        assert!(xml.contains("<ser:sendBill>"));
        assert!(xml.contains("<fileName>20000000001-01-F001-00000001.zip</fileName>"));
        assert!(xml.contains("<contentFile>UEs=</contentFile>"));
    }

    #[test]
    fn status_envelope_carries_ticket() {
        let xml = build_envelope(
            SoapMethod::GetStatus,
            &SolCredentials::beta_test(),
            SoapPayload::Ticket("1718000000000"),
        )
        .unwrap();
        assert!(xml.contains("<ser:getStatus>"));
        assert!(xml.contains("<ticket>1718000000000</ticket>"));
    }

    #[test]
    fn soap_actions() {
        assert_eq!(SoapMethod::SendBill.soap_action(), "urn:sendBill");
        assert_eq!(SoapMethod::SendSummary.soap_action(), "urn:sendSummary");
        assert_eq!(SoapMethod::GetStatus.soap_action(), "urn:getStatus");
    }

    #[test]
    fn parses_fault() {
        let body = envelope(
            "<soap-env:Fault><faultcode>soap-env:Client.0111</faultcode>\
             <faultstring>No tiene el perfil para enviar comprobantes electronicos</faultstring>\
             </soap-env:Fault>",
        );
        let err = parse_response(&body).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Fault {
                code: "soap-env:Client.0111".into(),
                message: "No tiene el perfil para enviar comprobantes electronicos".into(),
            }
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn parses_application_response() {
        let body = envelope(
            "<br:sendBillResponse xmlns:br=\"http://service.sunat.gob.pe\">\
             <applicationResponse>UEsDBA==</applicationResponse></br:sendBillResponse>",
        );
        assert_eq!(
            parse_response(&body).unwrap(),
            BillResponse::Receipt(vec![0x50, 0x4b, 0x03, 0x04])
        );
    }

    #[test]
    fn parses_ticket() {
        let body = envelope(
            "<br:sendSummaryResponse xmlns:br=\"http://service.sunat.gob.pe\">\
             <ticket>1718000000000</ticket></br:sendSummaryResponse>",
        );
        assert_eq!(
            parse_response(&body).unwrap(),
            BillResponse::Ticket("1718000000000".into())
        );
    }

    #[test]
    fn parses_status_pending_and_content() {
        let pending = envelope(
            "<br:getStatusResponse xmlns:br=\"http://service.sunat.gob.pe\">\
             <status><statusCode>98</statusCode></status></br:getStatusResponse>",
        );
        assert_eq!(
            parse_response(&pending).unwrap(),
            BillResponse::Pending {
                status_code: "98".into()
            }
        );

        let done = envelope(
            "<br:getStatusResponse xmlns:br=\"http://service.sunat.gob.pe\">\
             <status><statusCode>0</statusCode><content>UEsDBA==</content></status>\
             </br:getStatusResponse>",
        );
        assert!(matches!(
            parse_response(&done).unwrap(),
            BillResponse::Receipt(bytes) if bytes.len() == 4
        ));
    }

    #[test]
    fn bare_response_is_acknowledged() {
        let body = envelope("<ser:sendBillResponse xmlns:ser=\"http://service.sunat.gob.pe\"/>");
        assert_eq!(parse_response(&body).unwrap(), BillResponse::Acknowledged);
    }

    #[test]
    fn unknown_bodies_are_malformed() {
        assert!(matches!(
            parse_response(&envelope("<other/>")),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            parse_response("<html>gateway timeout</html>"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            parse_response("<soap-env:Envelope>"),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
