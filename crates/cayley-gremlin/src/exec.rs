//! Lazy, single-shot execution of terminal chains.
//!
//! Each link owns an execution state behind a mutex:
//!
//! ```text
//! Unexecuted ──first read──► Executing ──ok──► Cached(results)
//!                                      └─err─► Failed(error)
//! ```
//!
//! The lock is held for the whole request, so concurrent first reads of the
//! same link issue one request and the others wait for its outcome. `Cached`
//! and `Failed` are final.
//!
//! A client-side operator that wraps a terminal link reads its predecessor's
//! results and applies itself, so `q.all()` and `q.all().distinct()` share one
//! request.

use std::sync::Arc;

use serde_json::Value;

use crate::chain::{Link, Query};
use crate::error::{GremlinError, ProtocolError, Result, TransportError, UsageError};
use crate::ops;
use crate::record::{Record, ResultSet};
use crate::transport::RawResponse;

pub(crate) enum ExecState {
    Unexecuted,
    Executing,
    Cached(Arc<ResultSet>),
    Failed(GremlinError),
}

/// Observable phase of a link's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unexecuted,
    Executing,
    Cached,
    Failed,
}

impl Query {
    /// Results of this chain, fetching them on first use.
    ///
    /// Non-terminal chains fail with [`UsageError::NotExecutable`]. A failed
    /// execution is not retried: later calls return the same error.
    pub fn results(&self) -> Result<Arc<ResultSet>> {
        if !self.is_terminal() {
            return Err(UsageError::NotExecutable {
                query: self.to_query_string(),
                morphism: self.is_morphism(),
            }
            .into());
        }

        let mut state = self.node.state.lock();
        match &*state {
            ExecState::Cached(set) => {
                tracing::debug!(records = set.len(), "query cache hit");
                return Ok(Arc::clone(set));
            }
            ExecState::Failed(err) => return Err(err.clone()),
            ExecState::Executing => {
                return Err(TransportError::unreachable(
                    "an earlier execution of this query was interrupted",
                )
                .into());
            }
            ExecState::Unexecuted => {}
        }

        *state = ExecState::Executing;
        let outcome = self.execute();
        *state = match &outcome {
            Ok(set) => ExecState::Cached(Arc::clone(set)),
            Err(err) => ExecState::Failed(err.clone()),
        };
        outcome
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.results()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.results()?.is_empty())
    }

    pub fn get(&self, index: usize) -> Result<Option<Record>> {
        Ok(self.results()?.get(index).cloned())
    }

    pub fn first(&self) -> Result<Option<Record>> {
        self.get(0)
    }

    /// Owned copy of the records, for callers that want to iterate freely.
    pub fn to_vec(&self) -> Result<Vec<Record>> {
        Ok(self.results()?.records().to_vec())
    }

    /// Current execution phase. The lock is held while a request is in
    /// flight, so a contended lock reads as `Executing`.
    pub fn phase(&self) -> Phase {
        let Some(state) = self.node.state.try_lock() else {
            return Phase::Executing;
        };
        match &*state {
            ExecState::Unexecuted => Phase::Unexecuted,
            ExecState::Executing => Phase::Executing,
            ExecState::Cached(_) => Phase::Cached,
            ExecState::Failed(_) => Phase::Failed,
        }
    }

    fn execute(&self) -> Result<Arc<ResultSet>> {
        if let Link::Client(op) = &self.node.link {
            if let Some(pred) = self.predecessor().filter(|p| p.is_terminal()) {
                let base = pred.results()?;
                return Ok(Arc::new(op.apply(ResultSet::clone(&base))));
            }
        }

        let query = self.to_query_string();
        let tags = self.collect_tags();
        let client_ops = self.collect_client_ops();

        tracing::debug!(%query, ?tags, "submitting gremlin query");
        let raw = self.graph().transport().submit(&query).map_err(|err| {
            tracing::warn!(%query, error = %err, "gremlin query failed");
            GremlinError::from(err)
        })?;

        let parsed = interpret(&raw, &tags).inspect_err(|err| {
            tracing::warn!(%query, status = raw.status, error = %err, "gremlin query failed");
        })?;
        let set = ops::apply_all(&client_ops, parsed);
        tracing::info!(records = set.len(), "gremlin query executed");
        Ok(Arc::new(set))
    }
}

/// Turn an endpoint reply into records keyed by `tags`.
pub(crate) fn interpret(raw: &RawResponse, tags: &[String]) -> Result<ResultSet> {
    let body = serde_json::from_str::<Value>(&raw.body);

    if raw.status != 200 {
        let message = body.ok().as_ref().and_then(error_text);
        return Err(TransportError::status(raw.status, message).into());
    }

    let body = body.map_err(|e| ProtocolError::MalformedBody(e.to_string()))?;
    let Some(result) = body.get("result") else {
        return Err(ProtocolError::MissingResult {
            status: raw.status,
            error: error_text(&body),
        }
        .into());
    };

    match result {
        Value::Null => Ok(ResultSet::default()),
        Value::Array(items) => {
            let records = items
                .iter()
                .enumerate()
                .map(|(i, item)| Record::from_json(i, item, tags))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ResultSet::new(records))
        }
        other => Err(ProtocolError::MalformedBody(format!("'result' is not an array: {other}")).into()),
    }
}

fn error_text(body: &Value) -> Option<String> {
    body.get("error").map(|e| match e {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
