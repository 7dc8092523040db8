//! Sesame: client library for the OpenRDF Sesame HTTP protocol
//!
//! Maps logical operations on a triplestore (queries, statement CRUD,
//! namespace and context management) onto the stateless Sesame REST
//! protocol, and interprets the responses.
//!
//! Two layers:
//!
//! - **`Connection`**: owns the server base URL, lazily discovers the
//!   protocol version and repository list, and looks repositories up by id.
//! - **`RepositoryClient`**: bound to one repository; runs queries with
//!   content negotiation, reads/writes/deletes statements, manages
//!   namespaces, lists contexts and reports the repository size.
//!
//! Query text and RDF payloads are opaque strings passed through unmodified.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sesame::{Connection, QueryOptions, ResultFormat, StatementFilter};
//!
//! #[tokio::main]
//! async fn main() -> sesame::SesameResult<()> {
//!     let connection = Connection::new("http://localhost:8080/openrdf-sesame")?;
//!     println!("protocol {}", connection.protocol_version().await?);
//!
//!     let repo = connection.repository("test").await?.expect("no such repository");
//!
//!     let json = repo
//!         .query("SELECT ?s WHERE { ?s ?p ?o } LIMIT 10", &QueryOptions::default())
//!         .await?;
//!     println!("{}", String::from_utf8_lossy(&json));
//!
//!     let turtle = repo
//!         .get_statements(
//!             &StatementFilter::new().predicate("<http://xmlns.com/foaf/0.1/name>"),
//!             ResultFormat::Turtle,
//!         )
//!         .await?;
//!     println!("{}", String::from_utf8_lossy(&turtle));
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod format;
pub mod options;
pub mod repository;
pub mod results;
pub mod transport;

pub use bytes::Bytes;
pub use config::ClientConfig;
pub use connection::{normalize_base_url, Connection};
pub use error::{SesameError, SesameResult};
pub use filter::{Context, StatementFilter};
pub use format::{ResultFormat, ALL_FORMATS};
pub use options::{AddOptions, QueryMethod, QueryOptions};
pub use repository::{RepositoryClient, RepositoryDescriptor};
pub use results::{BoundTerm, SparqlJsonResults};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
