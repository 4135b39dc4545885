//! Step arguments and their Gremlin text form.

use crate::chain::Query;

/// A value passed to a step.
#[derive(Debug, Clone)]
pub enum Param {
    /// Renders as nothing: `Out(null)` serializes as `Out()`.
    Null,
    Str(String),
    Int(i64),
    /// Not a supported Gremlin literal; rendered as a quoted debug string.
    Float(f64),
    List(Vec<Param>),
    /// A nested chain, embedded as its own dotted expression.
    Query(Query),
}

/// Semantic kind of a `Param`, as checked by step argument rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Null,
    String,
    Integer,
    Float,
    Sequence,
    Chain,
}

impl ParamKind {
    pub fn name(self) -> &'static str {
        match self {
            ParamKind::Null => "null",
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Float => "float",
            ParamKind::Sequence => "sequence",
            ParamKind::Chain => "query",
        }
    }
}

impl Param {
    pub fn kind(&self) -> ParamKind {
        match self {
            Param::Null => ParamKind::Null,
            Param::Str(_) => ParamKind::String,
            Param::Int(_) => ParamKind::Integer,
            Param::Float(_) => ParamKind::Float,
            Param::List(_) => ParamKind::Sequence,
            Param::Query(_) => ParamKind::Chain,
        }
    }

    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Param::Query(q) => Some(q),
            _ => None,
        }
    }

    /// Gremlin text for this value.
    pub fn render(&self) -> String {
        match self {
            Param::Null => String::new(),
            Param::Str(s) => format!("\"{}\"", escape_quotes(s)),
            Param::Int(n) => n.to_string(),
            Param::Float(f) => format!("\"{f:?}\""),
            Param::List(items) => {
                let inner: Vec<String> = items.iter().map(Param::render).collect();
                format!("[{}]", inner.join(", "))
            }
            Param::Query(q) => q.to_query_string(),
        }
    }

    /// Labels this value contributes when a step's tag rule points at it.
    pub fn tag_candidates(&self) -> Vec<String> {
        match self {
            Param::Null => Vec::new(),
            Param::Str(s) => vec![s.clone()],
            Param::List(items) => items.iter().map(Param::label).collect(),
            other => vec![other.label()],
        }
    }

    fn label(&self) -> String {
        match self {
            Param::Str(s) => s.clone(),
            Param::Int(n) => n.to_string(),
            Param::Float(f) => format!("{f:?}"),
            other => other.render(),
        }
    }
}

/// Escape `"` as `\"`, leaving quotes that are already escaped alone.
fn escape_quotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                chars.next();
                out.push_str("\\\"");
            }
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Str(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Str(value)
    }
}

impl From<&String> for Param {
    fn from(value: &String) -> Self {
        Param::Str(value.clone())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Param::Int(i64::from(value))
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Int(i64::from(value))
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<Query> for Param {
    fn from(value: Query) -> Self {
        Param::Query(value)
    }
}

impl From<&Query> for Param {
    fn from(value: &Query) -> Self {
        Param::Query(value.clone())
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(value: Vec<T>) -> Self {
        Param::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Param>, const N: usize> From<[T; N]> for Param {
    fn from(value: [T; N]) -> Self {
        Param::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::Null, Into::into)
    }
}
