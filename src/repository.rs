//! Repository descriptors and the per-repository protocol client
//!
//! Every operation here is one self-contained request/response exchange
//! against the repository's resource URI:
//!
//! | Operation            | Method         | Path                        |
//! |----------------------|----------------|-----------------------------|
//! | query                | GET / POST     | `{repo}`                    |
//! | get statements       | GET            | `{repo}/statements?filter`  |
//! | delete statements    | DELETE         | `{repo}/statements?filter`  |
//! | add statements       | POST           | `{repo}/statements?fields`  |
//! | replace statements   | PUT            | `{repo}/statements`         |
//! | contexts             | GET            | `{repo}/contexts`           |
//! | namespaces           | GET / DELETE   | `{repo}/namespaces`         |
//! | one namespace        | GET/PUT/DELETE | `{repo}/namespaces/{prefix}`|
//! | size                 | GET            | `{repo}/size`               |

use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::encoding::{encode_fields, encode_path_segment, with_query};
use crate::error::{SesameError, SesameResult};
use crate::filter::StatementFilter;
use crate::format::ResultFormat;
use crate::options::{AddOptions, QueryMethod, QueryOptions};
use crate::results::{required_value, Binding, SparqlJsonResults};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Body prefix some servers send with a 200 instead of a 404 for unknown prefixes
const UNDEFINED_PREFIX: &str = "Undefined prefix:";

/// A repository as listed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Absolute URL of the repository resource
    pub uri: String,
    /// Repository identifier
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Whether the repository accepts writes
    pub writable: bool,
    /// Whether the repository can be read
    pub readable: bool,
}

impl RepositoryDescriptor {
    /// Build a descriptor from one binding of the repository listing.
    /// `uri` and `id` are required; `writable`/`readable` are true only for
    /// the literal string `"true"`.
    pub fn from_binding(binding: &Binding) -> SesameResult<Self> {
        let flag = |name: &str| binding.get(name).map(|t| t.value == "true").unwrap_or(false);

        Ok(Self {
            uri: required_value(binding, "uri")?.to_string(),
            id: required_value(binding, "id")?.to_string(),
            title: binding
                .get("title")
                .map(|t| t.value.clone())
                .unwrap_or_default(),
            writable: flag("writable"),
            readable: flag("readable"),
        })
    }

    /// Parse a SPARQL results JSON repository listing, keeping server order
    pub fn parse_listing(body: impl AsRef<[u8]>) -> SesameResult<Vec<Self>> {
        SparqlJsonResults::parse(body)?
            .bindings()
            .iter()
            .map(Self::from_binding)
            .collect()
    }
}

/// Client bound to one repository
#[derive(Clone)]
pub struct RepositoryClient {
    descriptor: RepositoryDescriptor,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for RepositoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryClient")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl RepositoryClient {
    /// Bind a client to a listed repository
    pub fn new(descriptor: RepositoryDescriptor, transport: Arc<dyn Transport>) -> Self {
        Self {
            descriptor,
            transport,
        }
    }

    /// Bind a client directly to a repository URI, without a listing.
    /// The id is taken from the last path segment.
    pub fn at_uri(uri: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let uri = uri.into();
        let id = uri
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let descriptor = RepositoryDescriptor {
            uri,
            id,
            title: String::new(),
            writable: true,
            readable: true,
        };
        Self::new(descriptor, transport)
    }

    pub fn descriptor(&self) -> &RepositoryDescriptor {
        &self.descriptor
    }

    pub fn uri(&self) -> &str {
        &self.descriptor.uri
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    fn resource(&self, path: &str) -> String {
        format!("{}/{}", self.descriptor.uri.trim_end_matches('/'), path)
    }

    fn statements_url(&self) -> String {
        self.resource("statements")
    }

    fn namespace_url(&self, prefix: &str) -> String {
        self.resource(&format!("namespaces/{}", encode_path_segment(prefix)))
    }

    async fn send(&self, request: HttpRequest) -> SesameResult<HttpResponse> {
        self.transport.execute(request).await
    }

    /// Send and require `expected` status; the body is returned byte for byte
    async fn send_expecting(&self, request: HttpRequest, expected: u16) -> SesameResult<Bytes> {
        let method = request.method.clone();
        let url = request.url.clone();
        let response = self.send(request).await?;
        if response.status != expected {
            warn!(
                "{} {} returned {} (expected {})",
                method, url, response.status, expected
            );
        }
        response.expect_status(expected)
    }

    async fn send_expecting_text(
        &self,
        request: HttpRequest,
        expected: u16,
    ) -> SesameResult<String> {
        let body = self.send_expecting(request, expected).await?;
        HttpResponse::new(expected, body).text()
    }

    // ============================================================
    // Queries
    // ============================================================

    /// Evaluate a query and return the raw result body in the requested format.
    ///
    /// The valid result formats depend on the query form: variable-binding
    /// formats for tuple queries, RDF formats for graph queries, boolean
    /// formats for ASK. The body is not decoded, so binary result tables
    /// come back intact.
    pub async fn query(&self, query: &str, options: &QueryOptions) -> SesameResult<Bytes> {
        debug!("Querying {}:\n{}\nOptions: {:?}", self.descriptor.id, query, options);

        let fields = options.fields(query);
        let accept = options.result_format.mime();

        let request = match options.method {
            QueryMethod::Get => HttpRequest::get(with_query(&self.descriptor.uri, &fields)?),
            QueryMethod::Post => HttpRequest::post(self.descriptor.uri.clone())
                .body(mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(), encode_fields(&fields)?),
        }
        .accept(accept);

        self.send_expecting(request, 200).await
    }

    // ============================================================
    // Statements
    // ============================================================

    /// Export the statements matching `filter` in an RDF format. An empty
    /// filter returns every statement in the repository.
    pub async fn get_statements(
        &self,
        filter: &StatementFilter,
        result_format: ResultFormat,
    ) -> SesameResult<Bytes> {
        require_format(result_format, result_format.is_rdf_format(), "statement export")?;
        let request = HttpRequest::get(with_query(&self.statements_url(), &filter.fields())?)
            .accept(result_format.mime());
        self.send_expecting(request, 200).await
    }

    /// Delete the statements matching `filter`.
    ///
    /// With `safety` on, a filter without a subject, predicate or object is
    /// refused locally with [`SesameError::UnsafeDelete`] and nothing is sent.
    /// With `safety` off, an empty filter deletes the whole repository.
    pub async fn delete_statements(
        &self,
        filter: &StatementFilter,
        safety: bool,
    ) -> SesameResult<()> {
        if safety && !filter.has_term_pattern() {
            warn!(
                "Refusing unqualified delete on repository {}",
                self.descriptor.id
            );
            return Err(SesameError::UnsafeDelete);
        }
        if filter.is_unrestricted() {
            info!("Deleting every statement in repository {}", self.descriptor.id);
        }

        let request = HttpRequest::delete(with_query(&self.statements_url(), &filter.fields())?);
        self.send_expecting(request, 204).await?;
        Ok(())
    }

    /// Delete every statement in the repository
    pub async fn delete_all_statements(&self) -> SesameResult<()> {
        self.delete_statements(&StatementFilter::new(), false).await
    }

    /// Upload an RDF document and add its statements to the repository
    pub async fn add_statements(&self, data: &str, options: &AddOptions) -> SesameResult<()> {
        let format = options.data_format;
        require_format(format, format.is_rdf_format(), "statement upload")?;
        let request = HttpRequest::post(with_query(&self.statements_url(), &options.fields())?)
            .body(format.mime(), data);
        self.send_expecting(request, 204).await?;
        Ok(())
    }

    /// Replace every statement in the repository with the uploaded document
    pub async fn replace_statements(
        &self,
        data: &str,
        data_format: ResultFormat,
    ) -> SesameResult<()> {
        require_format(data_format, data_format.is_rdf_format(), "statement upload")?;
        let request = HttpRequest::put(self.statements_url()).body(data_format.mime(), data);
        self.send_expecting(request, 204).await?;
        Ok(())
    }

    /// Number of statements in the repository
    pub async fn size(&self) -> SesameResult<u64> {
        let body = self
            .send_expecting_text(HttpRequest::get(self.resource("size")), 200)
            .await?;
        body.trim().parse().map_err(|_| {
            SesameError::UnexpectedResponse(format!("repository size is not a number: {:?}", body))
        })
    }

    // ============================================================
    // Contexts
    // ============================================================

    /// Context listing as returned by the server, in a variable-binding format
    pub async fn raw_contexts(&self, result_format: ResultFormat) -> SesameResult<Bytes> {
        require_format(result_format, result_format.is_tuple_format(), "context listing")?;
        let request = HttpRequest::get(self.resource("contexts")).accept(result_format.mime());
        self.send_expecting(request, 200).await
    }

    /// Context identifiers in server order
    pub async fn contexts(&self) -> SesameResult<Vec<String>> {
        let body = self.raw_contexts(ResultFormat::Json).await?;
        SparqlJsonResults::parse(&body)?
            .bindings()
            .iter()
            .map(|b| required_value(b, "contextID").map(str::to_string))
            .collect()
    }

    // ============================================================
    // Namespaces
    // ============================================================

    /// Namespace listing as returned by the server, in a variable-binding format
    pub async fn raw_namespaces(&self, result_format: ResultFormat) -> SesameResult<Bytes> {
        require_format(result_format, result_format.is_tuple_format(), "namespace listing")?;
        let request = HttpRequest::get(self.resource("namespaces")).accept(result_format.mime());
        self.send_expecting(request, 200).await
    }

    /// Prefix → namespace mapping, in server order
    pub async fn namespaces(&self) -> SesameResult<IndexMap<String, String>> {
        let body = self.raw_namespaces(ResultFormat::Json).await?;
        let mut namespaces = IndexMap::new();
        for binding in SparqlJsonResults::parse(&body)?.bindings() {
            namespaces.insert(
                required_value(binding, "prefix")?.to_string(),
                required_value(binding, "namespace")?.to_string(),
            );
        }
        Ok(namespaces)
    }

    /// Namespace bound to `prefix`, or `None` if the prefix is undefined
    pub async fn namespace(&self, prefix: &str) -> SesameResult<Option<String>> {
        let url = self.namespace_url(prefix);
        let response = self.send(HttpRequest::get(url.clone())).await?;

        match response.status {
            404 => Ok(None),
            200 => {
                let body = response.text()?;
                if is_undefined_prefix(&body) {
                    Ok(None)
                } else {
                    Ok(Some(body))
                }
            }
            status => {
                warn!("GET {} returned {} (expected 200 or 404)", url, status);
                Err(response.into_error())
            }
        }
    }

    /// Bind `prefix` to `namespace`
    pub async fn set_namespace(&self, prefix: &str, namespace: &str) -> SesameResult<()> {
        let request = HttpRequest::put(self.namespace_url(prefix)).raw_body(namespace);
        self.send_expecting(request, 204).await?;
        Ok(())
    }

    /// Remove the binding for `prefix`
    pub async fn delete_namespace(&self, prefix: &str) -> SesameResult<()> {
        self.send_expecting(HttpRequest::delete(self.namespace_url(prefix)), 204)
            .await?;
        Ok(())
    }

    /// Remove every namespace binding in the repository
    pub async fn delete_all_namespaces(&self) -> SesameResult<()> {
        self.send_expecting(HttpRequest::delete(self.resource("namespaces")), 204)
            .await?;
        Ok(())
    }
}

/// Refuse a format the operation cannot use, before any request is sent
fn require_format(
    format: ResultFormat,
    supported: bool,
    operation: &'static str,
) -> SesameResult<()> {
    if supported {
        Ok(())
    } else {
        Err(SesameError::UnsupportedFormat {
            format: format.name().to_string(),
            operation,
        })
    }
}

fn is_undefined_prefix(body: &str) -> bool {
    body.lines().any(|line| line.starts_with(UNDEFINED_PREFIX))
}
