//! Result and data formats understood by the Sesame REST protocol
//!
//! Each logical format maps to exactly one MIME type, which is what goes on
//! the wire in `Accept` (results) or `Content-Type` (uploaded data).

use crate::error::SesameError;
use std::fmt;
use std::str::FromStr;

/// Logical result/data format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultFormat {
    // Variable-binding formats (tuple queries)
    /// SPARQL results XML
    Xml,
    /// SPARQL results JSON
    #[default]
    Json,
    /// Binary RDF results table
    Binary,

    // RDF formats (graph queries, statement export/import)
    /// RDF/XML
    RdfXml,
    /// N-Triples
    NTriples,
    /// Turtle
    Turtle,
    /// Notation 3
    N3,
    /// TriX
    TriX,
    /// TriG
    TriG,

    // Boolean formats (ASK queries); `Xml` is valid here too
    /// Plain text boolean
    PlainTextBoolean,
}

/// Every format, in declaration order
pub const ALL_FORMATS: [ResultFormat; 10] = [
    ResultFormat::Xml,
    ResultFormat::Json,
    ResultFormat::Binary,
    ResultFormat::RdfXml,
    ResultFormat::NTriples,
    ResultFormat::Turtle,
    ResultFormat::N3,
    ResultFormat::TriX,
    ResultFormat::TriG,
    ResultFormat::PlainTextBoolean,
];

impl ResultFormat {
    /// Canonical MIME type sent to the server
    pub fn mime(&self) -> &'static str {
        match self {
            ResultFormat::Xml => "application/sparql-results+xml",
            ResultFormat::Json => "application/sparql-results+json",
            ResultFormat::Binary => "application/x-binary-rdf-results-table",
            ResultFormat::RdfXml => "application/rdf+xml",
            ResultFormat::NTriples => "text/plain",
            ResultFormat::Turtle => "application/x-turtle",
            ResultFormat::N3 => "text/rdf+n3",
            ResultFormat::TriX => "application/trix",
            ResultFormat::TriG => "application/x-trig",
            ResultFormat::PlainTextBoolean => "text/boolean",
        }
    }

    /// Short lowercase name, accepted back by `FromStr`
    pub fn name(&self) -> &'static str {
        match self {
            ResultFormat::Xml => "xml",
            ResultFormat::Json => "json",
            ResultFormat::Binary => "binary",
            ResultFormat::RdfXml => "rdfxml",
            ResultFormat::NTriples => "ntriples",
            ResultFormat::Turtle => "turtle",
            ResultFormat::N3 => "n3",
            ResultFormat::TriX => "trix",
            ResultFormat::TriG => "trig",
            ResultFormat::PlainTextBoolean => "boolean",
        }
    }

    /// Look a format up by its MIME type. Parameters such as `charset` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        ALL_FORMATS
            .iter()
            .copied()
            .find(|f| f.mime().eq_ignore_ascii_case(essence))
    }

    /// Variable-binding (tuple) result format
    pub fn is_tuple_format(&self) -> bool {
        matches!(self, ResultFormat::Xml | ResultFormat::Json | ResultFormat::Binary)
    }

    /// RDF serialization
    pub fn is_rdf_format(&self) -> bool {
        matches!(
            self,
            ResultFormat::RdfXml
                | ResultFormat::NTriples
                | ResultFormat::Turtle
                | ResultFormat::N3
                | ResultFormat::TriX
                | ResultFormat::TriG
        )
    }
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResultFormat {
    type Err = SesameError;

    /// Parses a short name (`turtle`, `rdf/xml`, `n-triples`, ...) or a MIME type
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | '/' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        let by_name = match normalized.as_str() {
            "xml" | "sparqlxml" => Some(ResultFormat::Xml),
            "json" | "sparqljson" => Some(ResultFormat::Json),
            "binary" | "brtr" => Some(ResultFormat::Binary),
            "rdfxml" => Some(ResultFormat::RdfXml),
            "ntriples" | "nt" => Some(ResultFormat::NTriples),
            "turtle" | "ttl" => Some(ResultFormat::Turtle),
            "n3" => Some(ResultFormat::N3),
            "trix" => Some(ResultFormat::TriX),
            "trig" => Some(ResultFormat::TriG),
            "boolean" | "plaintextboolean" => Some(ResultFormat::PlainTextBoolean),
            _ => None,
        };

        by_name
            .or_else(|| Self::from_mime(s))
            .ok_or_else(|| SesameError::UnknownFormat(s.to_string()))
    }
}
