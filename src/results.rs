//! SPARQL results JSON decoding
//!
//! Only the parts of `application/sparql-results+json` the listing endpoints
//! need: the `head.vars` list and `results.bindings`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{SesameError, SesameResult};

/// One bound RDF term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundTerm {
    /// `uri`, `literal`, `typed-literal` or `bnode`
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Lexical value
    pub value: String,
    /// Datatype IRI of a typed literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    /// Language tag of a literal
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// Variable name → bound term
pub type Binding = HashMap<String, BoundTerm>;

/// `head` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsHead {
    /// Projected variable names
    #[serde(default)]
    pub vars: Vec<String>,
}

/// `results` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsBody {
    /// Solutions in server order
    pub bindings: Vec<Binding>,
}

/// A decoded SPARQL results JSON document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparqlJsonResults {
    #[serde(default)]
    pub head: ResultsHead,
    pub results: ResultsBody,
}

impl SparqlJsonResults {
    /// Decode a response body
    pub fn parse(body: impl AsRef<[u8]>) -> SesameResult<Self> {
        Ok(serde_json::from_slice(body.as_ref())?)
    }

    /// Solutions in server order
    pub fn bindings(&self) -> &[Binding] {
        &self.results.bindings
    }

    /// Number of solutions
    pub fn len(&self) -> usize {
        self.results.bindings.len()
    }

    /// Whether there are no solutions
    pub fn is_empty(&self) -> bool {
        self.results.bindings.is_empty()
    }
}

/// Value of `variable` in `binding`, or an error naming the missing variable
pub fn required_value<'a>(binding: &'a Binding, variable: &str) -> SesameResult<&'a str> {
    binding
        .get(variable)
        .map(|term| term.value.as_str())
        .ok_or_else(|| {
            SesameError::UnexpectedResponse(format!("binding without '{}' variable", variable))
        })
}
