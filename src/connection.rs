//! Server connection: endpoint identity, lazily cached server metadata and
//! repository lookup

use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{SesameError, SesameResult};
use crate::format::ResultFormat;
use crate::repository::{RepositoryClient, RepositoryDescriptor};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Append a trailing `/` unless the URL already ends with one
pub fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Connection to a Sesame server.
///
/// Construction never touches the network unless asked to. The protocol
/// version and repository list are fetched on first use and cached for the
/// lifetime of the connection; concurrent first callers wait on the same
/// fetch instead of issuing their own.
pub struct Connection {
    base_url: String,
    transport: Arc<dyn Transport>,
    protocol_version: Mutex<Option<u32>>,
    repositories: Mutex<Option<Arc<Vec<RepositoryDescriptor>>>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Create a connection with default configuration
    ///
    /// # Example
    /// ```no_run
    /// # use sesame::Connection;
    /// let connection = Connection::new("http://localhost:8080/openrdf-sesame").unwrap();
    /// assert_eq!(connection.base_url(), "http://localhost:8080/openrdf-sesame/");
    /// ```
    pub fn new(url: &str) -> SesameResult<Self> {
        Self::with_config(url, &ClientConfig::default())
    }

    /// Create a connection using `reqwest` configured from `config`.
    /// `query_server_information` is ignored here; see [`Connection::connect`].
    pub fn with_config(url: &str, config: &ClientConfig) -> SesameResult<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(url, Arc::new(transport)))
    }

    /// Create a connection over a caller-supplied transport
    pub fn with_transport(url: &str, transport: Arc<dyn Transport>) -> Self {
        let base_url = normalize_base_url(url);
        debug!("Sesame connection initialized for {}", base_url);
        Self {
            base_url,
            transport,
            protocol_version: Mutex::new(None),
            repositories: Mutex::new(None),
        }
    }

    /// Create a connection and, if `config.query_server_information` is set,
    /// fetch the protocol version and repository list right away
    pub async fn connect(url: &str, config: &ClientConfig) -> SesameResult<Self> {
        let connection = Self::with_config(url, config)?;
        if config.query_server_information {
            connection.load_server_information().await?;
        }
        Ok(connection)
    }

    /// Same as [`Connection::connect`] with an explicit transport
    pub async fn connect_with_transport(
        url: &str,
        transport: Arc<dyn Transport>,
        query_server_information: bool,
    ) -> SesameResult<Self> {
        let connection = Self::with_transport(url, transport);
        if query_server_information {
            connection.load_server_information().await?;
        }
        Ok(connection)
    }

    async fn load_server_information(&self) -> SesameResult<()> {
        let version = self.query_version().await?;
        let repositories = self.query_repositories().await?;
        info!(
            "Connected to {} (protocol {}, {} repositories)",
            self.base_url,
            version,
            repositories.len()
        );
        Ok(())
    }

    /// Base URL, always ending in `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Transport shared with every repository client of this connection
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// GET a server-level resource and require a 200
    async fn fetch(&self, request: HttpRequest) -> SesameResult<HttpResponse> {
        let url = request.url.clone();
        let response = self.transport.execute(request).await?;
        if response.status != 200 {
            warn!("GET {} returned {} (expected 200)", url, response.status);
            return Err(response.into_error());
        }
        Ok(response)
    }

    async fn fetch_version(&self) -> SesameResult<u32> {
        let request = HttpRequest::get(format!("{}protocol", self.base_url));
        let body = self.fetch(request).await?.text()?;
        body.trim().parse().map_err(|_| {
            SesameError::UnexpectedResponse(format!("protocol version is not a number: {:?}", body))
        })
    }

    async fn fetch_repositories(&self) -> SesameResult<Vec<RepositoryDescriptor>> {
        let request = HttpRequest::get(format!("{}repositories", self.base_url))
            .accept(ResultFormat::Json.mime());
        let response = self.fetch(request).await?;
        RepositoryDescriptor::parse_listing(&response.body)
    }

    /// Fetch the protocol version from the server and replace the cached value
    pub async fn query_version(&self) -> SesameResult<u32> {
        let mut cached = self.protocol_version.lock().await;
        let version = self.fetch_version().await?;
        *cached = Some(version);
        Ok(version)
    }

    /// Protocol version, fetched once and cached
    pub async fn protocol_version(&self) -> SesameResult<u32> {
        let mut cached = self.protocol_version.lock().await;
        if let Some(version) = *cached {
            return Ok(version);
        }
        let version = self.fetch_version().await?;
        debug!("Server protocol version: {}", version);
        *cached = Some(version);
        Ok(version)
    }

    /// Fetch the repository list from the server and replace the cached list
    pub async fn query_repositories(&self) -> SesameResult<Arc<Vec<RepositoryDescriptor>>> {
        let mut cached = self.repositories.lock().await;
        let repositories = Arc::new(self.fetch_repositories().await?);
        *cached = Some(Arc::clone(&repositories));
        Ok(repositories)
    }

    /// Repositories in server listing order, fetched once and cached
    pub async fn repositories(&self) -> SesameResult<Arc<Vec<RepositoryDescriptor>>> {
        let mut cached = self.repositories.lock().await;
        if let Some(repositories) = cached.as_ref() {
            return Ok(Arc::clone(repositories));
        }
        let repositories = Arc::new(self.fetch_repositories().await?);
        debug!("Cached {} repositories from {}", repositories.len(), self.base_url);
        *cached = Some(Arc::clone(&repositories));
        Ok(repositories)
    }

    /// Client for the first repository whose id is `id`, or `None`
    pub async fn repository(&self, id: &str) -> SesameResult<Option<RepositoryClient>> {
        let repositories = self.repositories().await?;
        Ok(repositories
            .iter()
            .find(|r| r.id == id)
            .map(|descriptor| self.repository_client(descriptor.clone())))
    }

    /// Client for a descriptor, sharing this connection's transport
    pub fn repository_client(&self, descriptor: RepositoryDescriptor) -> RepositoryClient {
        RepositoryClient::new(descriptor, self.transport())
    }
}
