//! Per-operation option sets for queries and uploads

use indexmap::IndexMap;

use crate::encoding::Fields;
use crate::filter::Context;
use crate::format::ResultFormat;

/// HTTP verb used to send a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMethod {
    /// Fields in the query string
    #[default]
    Get,
    /// Fields in a form-encoded body
    Post,
}

/// Options for `RepositoryClient::query`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Requested result format (`Accept` header)
    pub result_format: ResultFormat,
    /// GET or POST
    pub method: QueryMethod,
    /// `sparql`, `serql`, or any language the server supports
    pub query_language: String,
    /// Include inferred statements; `false` is sent explicitly, `true` is the server default
    pub infer: bool,
    /// External variable bindings: variable name → N-Triples encoded value
    pub variable_bindings: IndexMap<String, String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            result_format: ResultFormat::Json,
            method: QueryMethod::Get,
            query_language: "sparql".to_string(),
            infer: true,
            variable_bindings: IndexMap::new(),
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result_format(mut self, format: ResultFormat) -> Self {
        self.result_format = format;
        self
    }

    pub fn method(mut self, method: QueryMethod) -> Self {
        self.method = method;
        self
    }

    /// Shorthand for `method(QueryMethod::Post)`
    pub fn post(self) -> Self {
        self.method(QueryMethod::Post)
    }

    pub fn query_language(mut self, language: impl Into<String>) -> Self {
        self.query_language = language.into();
        self
    }

    pub fn infer(mut self, infer: bool) -> Self {
        self.infer = infer;
        self
    }

    /// Bind `name` to an N-Triples encoded value outside the query text
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variable_bindings.insert(name.into(), value.into());
        self
    }

    /// Request fields for `query`: `query`, `queryLn`, optional `infer=false`,
    /// then one `$<name>` field per variable binding
    pub fn fields(&self, query: &str) -> Fields {
        let mut fields = vec![
            ("query".to_string(), query.to_string()),
            ("queryLn".to_string(), self.query_language.clone()),
        ];
        if !self.infer {
            fields.push(("infer".to_string(), "false".to_string()));
        }
        for (name, value) in &self.variable_bindings {
            fields.push((binding_key(name), value.clone()));
        }
        fields
    }
}

/// Field key that binds a query variable externally
pub fn binding_key(name: &str) -> String {
    format!("$<{}>", name)
}

/// Options for `RepositoryClient::add_statements`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOptions {
    /// Format of the uploaded data (`Content-Type` header)
    pub data_format: ResultFormat,
    /// Contexts the data is added to; empty means as given in the data
    pub contexts: Vec<Context>,
    /// Base URI for resolving relative URIs in the data
    pub base_uri: Option<String>,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            data_format: ResultFormat::Turtle,
            contexts: Vec::new(),
            base_uri: None,
        }
    }
}

impl AddOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_format(mut self, format: ResultFormat) -> Self {
        self.data_format = format;
        self
    }

    pub fn context(mut self, context: impl Into<Context>) -> Self {
        self.contexts.push(context.into());
        self
    }

    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Query-string fields. The data format only selects `Content-Type` and
    /// is never sent as a field.
    pub fn fields(&self) -> Fields {
        let mut fields: Fields = self
            .contexts
            .iter()
            .map(|c| ("context".to_string(), c.encoded().to_string()))
            .collect();
        if let Some(base_uri) = &self.base_uri {
            fields.push(("baseURI".to_string(), base_uri.clone()));
        }
        fields
    }
}
