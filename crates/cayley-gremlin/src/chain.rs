//! Query chains.
//!
//! A [`Query`] is one immutable link of a fluent chain. Each chained call
//! validates its arguments against the step's descriptor and returns a new
//! link that shares its predecessor, so a partial chain can be extended in
//! several directions or embedded as a sub-query.
//!
//! ```text
//! g.Vertex("x")  ->  .In("p")  ->  .Tag("t")  ->  .All()  ->  distinct
//!   root (id)         step          step (t)      terminal     client op
//! ```
//!
//! Serialization walks from the root: `g.Vertex("x").In("p").Tag("t").All()`.
//! Client-side operators are links too, but contribute nothing to the query
//! string.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::UsageError;
use crate::exec::ExecState;
use crate::graph::Graph;
use crate::ops::{ClientOp, Predicate, Transform};
use crate::param::Param;
use crate::step::{self, StepDescriptor, StepKind, TagRule};

/// Tag every root contributes.
pub const ID_TAG: &str = "id";

#[derive(Clone)]
pub struct Query {
    pub(crate) node: Arc<Node>,
}

pub(crate) struct Node {
    pub(crate) graph: Graph,
    pub(crate) predecessor: Option<Query>,
    pub(crate) link: Link,
    pub(crate) is_morphism: bool,
    pub(crate) state: Mutex<ExecState>,
}

pub(crate) enum Link {
    Step {
        step: &'static StepDescriptor,
        args: Vec<String>,
        tags: Vec<String>,
    },
    Client(ClientOp),
}

impl Query {
    fn from_node(
        graph: Graph,
        predecessor: Option<Query>,
        link: Link,
        is_morphism: bool,
    ) -> Self {
        Self {
            node: Arc::new(Node {
                graph,
                predecessor,
                link,
                is_morphism,
                state: Mutex::new(ExecState::Unexecuted),
            }),
        }
    }

    /// A chain root (`Vertex` or `Morphism`) directly on the graph handle.
    pub(crate) fn root(graph: Graph, kind: StepKind, args: Vec<Param>) -> Self {
        let step = kind.descriptor();
        let link = Link::Step {
            step,
            args: args.iter().map(Param::render).collect(),
            tags: vec![ID_TAG.to_string()],
        };
        Self::from_node(graph, None, link, kind == StepKind::Morphism)
    }

    /// Validate `args` against `step` and build the link that follows `self`.
    fn append(
        &self,
        step: &'static StepDescriptor,
        attempted: &str,
        args: Vec<Param>,
    ) -> Result<Query, UsageError> {
        if step.root_only {
            return Err(UsageError::RootOnlyStep(step.name));
        }
        if let Some(terminal) = self.terminal_step() {
            return Err(UsageError::TerminalChain {
                terminal,
                attempted: attempted.to_string(),
            });
        }

        step.check_arity(args.len())?;

        for check in step.arg_checks {
            let Some(arg) = args.get(check.index) else {
                continue;
            };
            if !check.accepts.contains(&arg.kind()) {
                let expected: Vec<&str> = check.accepts.iter().map(|k| k.name()).collect();
                return Err(UsageError::ArgType {
                    step: step.name,
                    index: check.index,
                    expected: expected.join(" or "),
                    actual: arg.kind().name(),
                });
            }
        }

        let mut tags = match step.tag_rule {
            TagRule::None => Vec::new(),
            TagRule::Arg(i) => args.get(i).map(Param::tag_candidates).unwrap_or_default(),
            TagRule::Args(start, end) => args
                .iter()
                .take(end)
                .skip(start)
                .flat_map(Param::tag_candidates)
                .collect(),
        };

        for &index in step.requires_morphism {
            match args.get(index).and_then(Param::as_query) {
                Some(sub) if sub.is_morphism() => tags.extend(sub.collect_tags()),
                _ => {
                    return Err(UsageError::MorphismRequired {
                        step: step.name,
                        index,
                    })
                }
            }
        }

        let link = Link::Step {
            step,
            args: args.iter().map(Param::render).collect(),
            tags,
        };
        Ok(Self::from_node(
            self.node.graph.clone(),
            Some(self.clone()),
            link,
            self.is_morphism(),
        ))
    }

    /// Chain a step by name (or alias), e.g. `q.step("Out", vec!["p".into()])`.
    ///
    /// Unknown names fail with [`UsageError::UnknownStep`] before any argument
    /// is looked at. Root names (`V`, `Vertex`, `M`, `Morphism`) fail with
    /// [`UsageError::RootOnlyStep`] instead, so callers that fall through on
    /// `UnknownStep` must handle both.
    pub fn step(&self, name: &str, args: Vec<Param>) -> Result<Query, UsageError> {
        let descriptor = step::lookup(name)?;
        self.append(descriptor, name, args)
    }

    /// Chain a step by kind.
    pub fn step_kind(&self, kind: StepKind, args: Vec<Param>) -> Result<Query, UsageError> {
        let descriptor = kind.descriptor();
        self.append(descriptor, descriptor.name, args)
    }

    /// Append a client-side operator. The query string is unchanged.
    pub fn with_op(&self, op: ClientOp) -> Query {
        Self::from_node(
            self.node.graph.clone(),
            Some(self.clone()),
            Link::Client(op),
            self.is_morphism(),
        )
    }

    pub fn distinct(&self) -> Query {
        self.with_op(ClientOp::Distinct)
    }

    pub fn filter(&self, predicate: Predicate) -> Query {
        self.with_op(ClientOp::Filter(predicate))
    }

    pub fn map(&self, transform: Transform) -> Query {
        self.with_op(ClientOp::Map(transform))
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub fn graph(&self) -> &Graph {
        &self.node.graph
    }

    pub fn predecessor(&self) -> Option<&Query> {
        self.node.predecessor.as_ref()
    }

    /// The step this link adds, or `None` for a client-side operator.
    pub fn step_descriptor(&self) -> Option<&'static StepDescriptor> {
        match &self.node.link {
            Link::Step { step, .. } => Some(*step),
            Link::Client(_) => None,
        }
    }

    /// True iff the chain's root is a Morphism.
    pub fn is_morphism(&self) -> bool {
        self.node.is_morphism
    }

    /// Name of the terminal step this chain ends in, looking through trailing
    /// client-side operators.
    fn terminal_step(&self) -> Option<&'static str> {
        match &self.node.link {
            Link::Step { step, .. } if step.terminal => Some(step.name),
            Link::Step { .. } => None,
            Link::Client(_) => self.predecessor().and_then(Query::terminal_step),
        }
    }

    /// True when the chain can be executed.
    pub fn is_terminal(&self) -> bool {
        self.terminal_step().is_some()
    }

    /// Links from the root to `self`, root first.
    fn lineage(&self) -> Vec<&Query> {
        let mut out = Vec::new();
        let mut cur = Some(self);
        while let Some(q) = cur {
            out.push(q);
            cur = q.predecessor();
        }
        out.reverse();
        out
    }

    /// The Gremlin text for the whole chain.
    pub fn to_query_string(&self) -> String {
        let mut out = String::from(Graph::TOKEN);
        for q in self.lineage() {
            if let Link::Step { step, args, .. } = &q.node.link {
                out.push('.');
                out.push_str(step.name);
                out.push('(');
                out.push_str(&args.join(", "));
                out.push(')');
            }
        }
        out
    }

    /// Result tags for the chain, root first, without duplicates.
    pub fn collect_tags(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for q in self.lineage() {
            if let Link::Step { tags, .. } = &q.node.link {
                for tag in tags {
                    if !out.contains(tag) {
                        out.push(tag.clone());
                    }
                }
            }
        }
        out
    }

    /// Client-side operators along the chain, root first.
    pub fn collect_client_ops(&self) -> Vec<ClientOp> {
        self.lineage()
            .into_iter()
            .filter_map(|q| match &q.node.link {
                Link::Client(op) => Some(op.clone()),
                Link::Step { .. } => None,
            })
            .collect()
    }

    /// True when both handles are the same link.
    pub fn same_link(&self, other: &Query) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    // ------------------------------------------------------------------------
    // Typed steps
    // ------------------------------------------------------------------------

    /// `In(predicate)`
    pub fn in_(&self, predicate: impl Into<Param>) -> Result<Query, UsageError> {
        self.step_kind(StepKind::In, vec![predicate.into()])
    }

    /// `In(predicate, tags)`: the followed vertices are also saved under `tags`.
    pub fn in_tagged(
        &self,
        predicate: impl Into<Param>,
        tags: impl Into<Param>,
    ) -> Result<Query, UsageError> {
        self.step_kind(StepKind::In, vec![predicate.into(), tags.into()])
    }

    pub fn out(&self, predicate: impl Into<Param>) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Out, vec![predicate.into()])
    }

    pub fn out_tagged(
        &self,
        predicate: impl Into<Param>,
        tags: impl Into<Param>,
    ) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Out, vec![predicate.into(), tags.into()])
    }

    pub fn both(&self, predicate: impl Into<Param>) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Both, vec![predicate.into()])
    }

    pub fn both_tagged(
        &self,
        predicate: impl Into<Param>,
        tags: impl Into<Param>,
    ) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Both, vec![predicate.into(), tags.into()])
    }

    pub fn is(&self, node: impl Into<Param>) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Is, vec![node.into()])
    }

    pub fn has(&self, predicate: &str, object: &str) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Has, vec![predicate.into(), object.into()])
    }

    /// `Tag(label)` or `Tag([labels...])`.
    pub fn tag(&self, labels: impl Into<Param>) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Tag, vec![labels.into()])
    }

    /// Alias of [`Query::tag`]; serializes as `Tag`.
    pub fn as_(&self, labels: impl Into<Param>) -> Result<Query, UsageError> {
        self.tag(labels)
    }

    pub fn save(&self, predicate: &str, tag: &str) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Save, vec![predicate.into(), tag.into()])
    }

    pub fn back(&self, tag: &str) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Back, vec![tag.into()])
    }

    pub fn follow(&self, morphism: &Query) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Follow, vec![morphism.into()])
    }

    pub fn follow_r(&self, morphism: &Query) -> Result<Query, UsageError> {
        self.step_kind(StepKind::FollowR, vec![morphism.into()])
    }

    pub fn intersect(&self, other: &Query) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Intersect, vec![other.into()])
    }

    /// Alias of [`Query::intersect`].
    pub fn and(&self, other: &Query) -> Result<Query, UsageError> {
        self.intersect(other)
    }

    pub fn union(&self, other: &Query) -> Result<Query, UsageError> {
        self.step_kind(StepKind::Union, vec![other.into()])
    }

    /// Alias of [`Query::union`].
    pub fn or(&self, other: &Query) -> Result<Query, UsageError> {
        self.union(other)
    }

    pub fn all(&self) -> Result<Query, UsageError> {
        self.step_kind(StepKind::All, Vec::new())
    }

    pub fn get_limit(&self, limit: i64) -> Result<Query, UsageError> {
        self.step_kind(StepKind::GetLimit, vec![limit.into()])
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("query", &self.to_query_string())
            .field("tags", &self.collect_tags())
            .field("morphism", &self.is_morphism())
            .field("phase", &self.phase())
            .finish()
    }
}
