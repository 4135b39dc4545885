//! Chainable Gremlin queries for the Cayley graph database.
//!
//! Queries are built from a [`Graph`] handle one step at a time, validated as
//! they are built, and executed lazily: the first read of a terminal chain
//! (`All`, `GetLimit`) serializes it, posts it to the endpoint once and caches
//! the records.
//!
//! ```no_run
//! use cayley_gremlin::{freebase, Graph};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let g = Graph::from_env()?;
//! let aliases = g
//!     .v(freebase::lang_en("Paul McCartney"))
//!     .in_(freebase::rdf("type.object.name"))?
//!     .out(freebase::rdf("common.topic.alias"))?
//!     .all()?;
//!
//! for record in aliases.results()?.iter() {
//!     println!("{}", &record["id"]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Modules:
//! - `param`: step arguments and their Gremlin text
//! - `step`: the step registry (arity, argument kinds, tags, terminal steps)
//! - `chain`: immutable query links, serialization, tag accumulation
//! - `exec`: the execute-once cache
//! - `ops`: client-side distinct / filter / map
//! - `transport`, `settings`: the HTTP endpoint
//! - `freebase`: helpers for Freebase URIs and language literals

pub mod chain;
pub mod error;
pub mod exec;
pub mod freebase;
pub mod graph;
pub mod ops;
pub mod param;
pub mod record;
pub mod settings;
pub mod step;
pub mod transport;

pub use chain::Query;
pub use error::{GremlinError, ProtocolError, Result, TransportError, UsageError};
pub use exec::Phase;
pub use graph::Graph;
pub use ops::{ClientOp, Predicate, Transform};
pub use param::Param;
pub use record::{Record, ResultSet};
pub use settings::{Settings, SettingsError};
pub use step::{StepDescriptor, StepKind};
pub use transport::{HttpTransport, RawResponse, Transport};
