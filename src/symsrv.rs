//! Downloading PDB files from a Microsoft-style symbol server.
//!
//! Symbol servers keep each PDB at `<store>/<name>/<signature>/<name>`, for example
//! <https://msdl.microsoft.com/download/symbols/vcruntime140_1.amd64.pdb/9C85A7373CC2BC2A7AB9C9388952B8F81/vcruntime140_1.amd64.pdb>.

use std::future::Future;

use bytes::Bytes;
use reqwest::StatusCode;

use crate::error::FetchError;
use crate::identity::SymbolIdentity;

pub const DEFAULT_SYMBOL_SERVER: &str = "https://msdl.microsoft.com/download/symbols";

/// Status code and body of a finished GET request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Performs the GET request for [`SymbolFetcher`]. [`ReqwestTransport`] is the
/// real implementation; tests plug in canned responses.
pub trait HttpTransport {
    /// Fetches `url`. Only transport-level faults are errors here, any HTTP
    /// status is returned as a response.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, FetchError>> + Send;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::ClientCreationFailed(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    /// The body is only read for 200 responses.
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = if status == StatusCode::OK {
            response.bytes().await?
        } else {
            Bytes::new()
        };
        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// The full URL of the PDB for `identity` on the store at `store_base_url`, or
/// on [`DEFAULT_SYMBOL_SERVER`] if no store is given.
pub fn symbol_url(identity: &SymbolIdentity, store_base_url: Option<&str>) -> String {
    let store = store_base_url.unwrap_or(DEFAULT_SYMBOL_SERVER);
    let store = store.strip_suffix('/').unwrap_or(store);
    format!("{}/{}", store, identity.store_path())
}

pub struct SymbolFetcher<T: HttpTransport = ReqwestTransport> {
    transport: T,
}

impl SymbolFetcher<ReqwestTransport> {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self::with_transport(ReqwestTransport::new()?))
    }
}

impl<T: HttpTransport> SymbolFetcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Downloads the PDB for `identity` with a single request. There are no
    /// retries and no timeout; wrap the future if you need a deadline.
    pub async fn fetch(
        &self,
        identity: &SymbolIdentity,
        store_base_url: Option<&str>,
    ) -> Result<Bytes, FetchError> {
        let url = symbol_url(identity, store_base_url);
        log::info!("Downloading {}...", url);
        let response = self.transport.get(&url).await?;
        match response.status {
            200 => {
                log::info!("Downloaded {} bytes from {}", response.body.len(), url);
                Ok(response.body)
            }
            404 => Err(FetchError::PdbNotFound),
            status => {
                log::info!("{} returned status {}", url, status);
                Err(FetchError::UnexpectedReturnStatus(status))
            }
        }
    }
}
