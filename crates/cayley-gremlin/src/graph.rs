//! The graph handle `g`: where every chain starts.

use std::fmt;
use std::sync::Arc;

use crate::chain::Query;
use crate::param::Param;
use crate::settings::{Settings, SettingsError};
use crate::step::StepKind;
use crate::transport::{HttpTransport, Transport};

/// Entry point for building queries against one endpoint.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct Graph {
    transport: Arc<dyn Transport>,
}

impl Graph {
    /// Serialized form of the handle itself.
    pub const TOKEN: &'static str = "g";

    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn with_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// HTTP transport for the endpoint described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let transport = HttpTransport::new(settings).map_err(|e| SettingsError::Invalid {
            key: "transport",
            value: settings.query_url(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(transport))
    }

    /// HTTP transport configured from `CAYLEY_*` environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_settings(&Settings::from_env()?)
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// `g.V(id)`
    pub fn v(&self, id: impl Into<Param>) -> Query {
        self.vertex(vec![id.into()])
    }

    /// `g.Vertex(args...)`; no arguments means every vertex.
    pub fn vertex(&self, args: Vec<Param>) -> Query {
        Query::root(self.clone(), StepKind::Vertex, args)
    }

    /// `g.M()`
    pub fn m(&self) -> Query {
        self.morphism()
    }

    /// `g.Morphism()`: a reusable path, usable with `Follow`/`FollowR`.
    pub fn morphism(&self) -> Query {
        Query::root(self.clone(), StepKind::Morphism, Vec::new())
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::TOKEN)
    }
}
