//! Async `billService` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::soap::{self, BillResponse, ProtocolError, SoapMethod, SoapPayload};
use super::{Environment, SolCredentials};

/// Default HTTP timeout for a `billService` call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A decoded response together with the raw SOAP body it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillReply {
    pub response: BillResponse,
    pub raw: String,
}

/// The remote tax authority service.
#[async_trait]
pub trait BillService: Send + Sync {
    /// Upload a single document archive.
    async fn send_bill(&self, file_name: &str, archive: &[u8]) -> Result<BillReply, ProtocolError>;

    /// Upload an archive for deferred processing; answered with a ticket.
    async fn send_summary(
        &self,
        file_name: &str,
        archive: &[u8],
    ) -> Result<BillReply, ProtocolError>;

    /// Query the state of a ticket.
    async fn get_status(&self, ticket: &str) -> Result<BillReply, ProtocolError>;
}

/// SOAP 1.1 client over HTTPS (rustls).
///
/// ```rust,no_run
/// use comprobante::sunat::{BillService, Environment, SoapClient, SolCredentials};
///
/// # async fn run() -> Result<(), comprobante::sunat::ProtocolError> {
/// let client = SoapClient::for_environment(Environment::Beta, SolCredentials::beta_test())?;
/// let reply = client.get_status("1718000000000").await?;
/// # let _ = reply;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SoapClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: SolCredentials,
}

impl SoapClient {
    pub fn new(
        endpoint: impl Into<String>,
        credentials: SolCredentials,
        timeout: Duration,
    ) -> Result<Self, ProtocolError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("comprobante/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    pub fn for_environment(
        environment: Environment,
        credentials: SolCredentials,
    ) -> Result<Self, ProtocolError> {
        Self::new(environment.endpoint_url(), credentials, DEFAULT_TIMEOUT)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(
        &self,
        method: SoapMethod,
        payload: SoapPayload<'_>,
    ) -> Result<BillReply, ProtocolError> {
        let envelope = soap::build_envelope(method, &self.credentials, payload)
            .map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        tracing::debug!(method = method.as_str(), endpoint = %self.endpoint, "calling billService");
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", method.soap_action())
            .body(envelope)
            .send()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        tracing::debug!(method = method.as_str(), status = status.as_u16(), "billService answered");

        if !status.is_success() {
            // SOAP 1.1 services return faults with HTTP 500.
            return match soap::parse_response(&body) {
                Err(fault @ ProtocolError::Fault { .. }) => Err(fault),
                _ => Err(ProtocolError::Transport(format!(
                    "HTTP {status}: {}",
                    excerpt(&body)
                ))),
            };
        }

        let response = soap::parse_response(&body)?;
        Ok(BillReply {
            response,
            raw: body,
        })
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((i, _)) => &body[..i],
        None => body,
    }
}

#[async_trait]
impl BillService for SoapClient {
    async fn send_bill(&self, file_name: &str, archive: &[u8]) -> Result<BillReply, ProtocolError> {
        self.call(SoapMethod::SendBill, SoapPayload::Upload { file_name, archive })
            .await
    }

    async fn send_summary(
        &self,
        file_name: &str,
        archive: &[u8],
    ) -> Result<BillReply, ProtocolError> {
        self.call(SoapMethod::SendSummary, SoapPayload::Upload { file_name, archive })
            .await
    }

    async fn get_status(&self, ticket: &str) -> Result<BillReply, ProtocolError> {
        self.call(SoapMethod::GetStatus, SoapPayload::Ticket(ticket)).await
    }
}
