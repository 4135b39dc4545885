//! `Name` / `Name=<json array>` step arguments from the command line.

use anyhow::{anyhow, bail, Context, Result};
use cayley_gremlin::freebase::DEFAULT_LANG;
use cayley_gremlin::{Graph, Param, Predicate, Query, Transform};
use serde_json::Value;

/// One step as typed on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct StepArg {
    pub name: String,
    pub args: Vec<Value>,
}

impl StepArg {
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, args) = match raw.split_once('=') {
            Some((name, json)) => {
                let value: Value = serde_json::from_str(json)
                    .with_context(|| format!("arguments of `{name}` are not JSON: {json}"))?;
                match value {
                    Value::Array(items) => (name, items),
                    other => bail!("arguments of `{name}` must be a JSON array, got {other}"),
                }
            }
            None => (raw, Vec::new()),
        };
        if name.is_empty() {
            bail!("empty step name in `{raw}`");
        }
        Ok(Self {
            name: name.to_string(),
            args,
        })
    }

    fn params(&self) -> Result<Vec<Param>> {
        self.args
            .iter()
            .map(|v| to_param(v).with_context(|| format!("in step `{}`", self.name)))
            .collect()
    }
}

fn to_param(value: &Value) -> Result<Param> {
    Ok(match value {
        Value::Null => Param::Null,
        Value::Bool(b) => bail!("booleans are not step arguments: {b}"),
        Value::String(s) => Param::Str(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Param::Int(i),
            None => Param::Float(n.as_f64().ok_or_else(|| anyhow!("unrepresentable number {n}"))?),
        },
        Value::Array(items) => Param::List(items.iter().map(to_param).collect::<Result<_>>()?),
        Value::Object(_) => bail!("objects are not step arguments: {value}"),
    })
}

/// Build a chain from `steps`; the first one must be a root.
pub fn build(graph: &Graph, steps: &[StepArg]) -> Result<Query> {
    let (root, rest) = steps
        .split_first()
        .ok_or_else(|| anyhow!("a query needs at least a root step (V or M)"))?;

    let mut query = match root.name.as_str() {
        "V" | "Vertex" => graph.vertex(root.params()?),
        "M" | "Morphism" => {
            if !root.args.is_empty() {
                bail!("`{}` takes no arguments", root.name);
            }
            graph.morphism()
        }
        other => bail!("query must start with V/Vertex or M/Morphism, not `{other}`"),
    };

    for step in rest {
        query = query.step(&step.name, step.params()?)?;
    }
    Ok(query)
}

/// `cayley query` flags that shape the chain after it is built.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub distinct: bool,
    pub clean: bool,
    pub lang: Option<String>,
    pub limit: Option<i64>,
}

/// Make `query` executable and add client-side operators in the order
/// language filter, distinct, clean.
pub fn finish(query: Query, opts: &QueryOptions) -> Result<Query> {
    let mut query = if query.is_terminal() {
        if opts.limit.is_some() {
            bail!("--limit cannot be combined with a query that already ends in All/GetLimit");
        }
        query
    } else {
        match opts.limit {
            Some(n) => query.get_limit(n)?,
            None => query.all()?,
        }
    };

    if let Some(lang) = &opts.lang {
        query = query.filter(Predicate::Language(lang.clone()));
    }
    if opts.distinct {
        query = query.distinct();
    }
    if opts.clean {
        let lang = opts.lang.clone().unwrap_or_else(|| DEFAULT_LANG.to_string());
        query = query.map(Transform::CleanRdf { lang });
    }
    Ok(query)
}
