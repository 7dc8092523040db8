//! Statement filters
//!
//! A `StatementFilter` addresses a subset of a repository's statements for
//! `GET` and `DELETE` on `/statements`. All terms are N-Triples encoded and
//! passed through untouched.

use crate::encoding::Fields;

/// Context restriction for a statement filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Context {
    /// Statements without a context (sent as the literal `null`)
    Null,
    /// N-Triples encoded URI or blank node
    Resource(String),
}

impl Context {
    /// Wire form of the context
    pub fn encoded(&self) -> &str {
        match self {
            Context::Null => "null",
            Context::Resource(term) => term,
        }
    }

    /// Parse a wire value; `null` is the context-less sentinel
    pub fn parse(value: &str) -> Self {
        if value == "null" {
            Context::Null
        } else {
            Context::Resource(value.to_string())
        }
    }
}

impl From<&str> for Context {
    fn from(value: &str) -> Self {
        Context::Resource(value.to_string())
    }
}

impl From<String> for Context {
    fn from(value: String) -> Self {
        Context::Resource(value)
    }
}

/// Subset of statements addressed by subject, predicate, object and context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementFilter {
    /// N-Triples encoded subject
    pub subj: Option<String>,
    /// N-Triples encoded predicate
    pub pred: Option<String>,
    /// N-Triples encoded object
    pub obj: Option<String>,
    /// Contexts to operate on; empty means all contexts
    pub contexts: Vec<Context>,
    /// Include inferred statements (server default when `None`)
    pub infer: Option<bool>,
}

impl StatementFilter {
    /// Filter matching every statement
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subj: impl Into<String>) -> Self {
        self.subj = Some(subj.into());
        self
    }

    pub fn predicate(mut self, pred: impl Into<String>) -> Self {
        self.pred = Some(pred.into());
        self
    }

    pub fn object(mut self, obj: impl Into<String>) -> Self {
        self.obj = Some(obj.into());
        self
    }

    /// Add a context; repeated calls operate on the union of contexts
    pub fn context(mut self, context: impl Into<Context>) -> Self {
        self.contexts.push(context.into());
        self
    }

    /// Restrict to context-less statements
    pub fn null_context(mut self) -> Self {
        self.contexts.push(Context::Null);
        self
    }

    pub fn infer(mut self, infer: bool) -> Self {
        self.infer = Some(infer);
        self
    }

    /// Build a filter from loose key/value pairs.
    ///
    /// Recognised keys are `subj`, `pred`, `obj`, `context` (repeatable) and
    /// `infer`; anything else is dropped. An `infer` value other than
    /// `true`/`false` is dropped as well.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filter = Self::new();
        for (key, value) in params {
            let value: String = value.into();
            match key.as_ref() {
                "subj" => filter.subj = Some(value),
                "pred" => filter.pred = Some(value),
                "obj" => filter.obj = Some(value),
                "context" => filter.contexts.push(Context::parse(&value)),
                "infer" => match value.as_str() {
                    "true" => filter.infer = Some(true),
                    "false" => filter.infer = Some(false),
                    _ => {}
                },
                _ => {}
            }
        }
        filter
    }

    /// Whether any of subject, predicate or object is set
    pub fn has_term_pattern(&self) -> bool {
        self.subj.is_some() || self.pred.is_some() || self.obj.is_some()
    }

    /// Whether the filter matches every statement in the repository
    pub fn is_unrestricted(&self) -> bool {
        !self.has_term_pattern() && self.contexts.is_empty()
    }

    /// Request fields, in `subj`, `pred`, `obj`, `context`*, `infer` order
    pub fn fields(&self) -> Fields {
        let mut fields = Fields::new();
        if let Some(subj) = &self.subj {
            fields.push(("subj".to_string(), subj.clone()));
        }
        if let Some(pred) = &self.pred {
            fields.push(("pred".to_string(), pred.clone()));
        }
        if let Some(obj) = &self.obj {
            fields.push(("obj".to_string(), obj.clone()));
        }
        for context in &self.contexts {
            fields.push(("context".to_string(), context.encoded().to_string()));
        }
        if let Some(infer) = self.infer {
            fields.push(("infer".to_string(), infer.to_string()));
        }
        fields
    }
}
