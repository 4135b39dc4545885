//! Step registry: what each Gremlin step accepts and what it contributes.
//!
//! Every step kind is described once by a static [`StepDescriptor`]. The
//! by-name table ([`lookup`]) is built on first use and never changes
//! afterwards. `Vertex` and `Morphism` start chains; they have descriptors
//! (serialization needs their names) but are not in the by-name table.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::UsageError;
use crate::param::ParamKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Vertex,
    Morphism,
    In,
    Out,
    Both,
    Is,
    Has,
    Tag,
    Save,
    Back,
    Follow,
    FollowR,
    Intersect,
    Union,
    All,
    GetLimit,
}

/// Which argument(s) become result tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRule {
    None,
    Arg(usize),
    /// Half-open range of argument indices.
    Args(usize, usize),
}

/// The argument at `index`, when present, must be one of `accepts`.
#[derive(Debug, Clone, Copy)]
pub struct ArgCheck {
    pub index: usize,
    pub accepts: &'static [ParamKind],
}

#[derive(Debug)]
pub struct StepDescriptor {
    pub kind: StepKind,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub min_args: Option<usize>,
    pub max_args: Option<usize>,
    pub arg_checks: &'static [ArgCheck],
    pub tag_rule: TagRule,
    /// Argument indices that must be chains rooted at a Morphism.
    pub requires_morphism: &'static [usize],
    pub terminal: bool,
    /// Chain roots: built from the graph handle, never chained to by name.
    pub root_only: bool,
}

impl StepDescriptor {
    pub fn check_arity(&self, actual: usize) -> Result<(), UsageError> {
        if let Some(min) = self.min_args {
            if actual < min {
                return Err(UsageError::TooFewArgs {
                    step: self.name,
                    expected: min,
                    actual,
                });
            }
        }
        if let Some(max) = self.max_args {
            if actual > max {
                return Err(UsageError::TooManyArgs {
                    step: self.name,
                    expected: max,
                    actual,
                });
            }
        }
        Ok(())
    }
}

const STRING: &[ParamKind] = &[ParamKind::String];
const INTEGER: &[ParamKind] = &[ParamKind::Integer];
const CHAIN: &[ParamKind] = &[ParamKind::Chain];
const LABELS: &[ParamKind] = &[ParamKind::String, ParamKind::Sequence];

const fn step(kind: StepKind, name: &'static str) -> StepDescriptor {
    StepDescriptor {
        kind,
        name,
        aliases: &[],
        min_args: None,
        max_args: None,
        arg_checks: &[],
        tag_rule: TagRule::None,
        requires_morphism: &[],
        terminal: false,
        root_only: false,
    }
}

// ============================================================================
// Step table
// ============================================================================

pub static STEPS: &[StepDescriptor] = &[
    // Roots
    StepDescriptor {
        aliases: &["V"],
        root_only: true,
        ..step(StepKind::Vertex, "Vertex")
    },
    StepDescriptor {
        aliases: &["M"],
        max_args: Some(0),
        root_only: true,
        ..step(StepKind::Morphism, "Morphism")
    },
    // Paths
    StepDescriptor {
        max_args: Some(2),
        tag_rule: TagRule::Arg(1),
        ..step(StepKind::In, "In")
    },
    StepDescriptor {
        max_args: Some(2),
        tag_rule: TagRule::Arg(1),
        ..step(StepKind::Out, "Out")
    },
    StepDescriptor {
        max_args: Some(2),
        tag_rule: TagRule::Arg(1),
        ..step(StepKind::Both, "Both")
    },
    StepDescriptor {
        min_args: Some(1),
        ..step(StepKind::Is, "Is")
    },
    StepDescriptor {
        min_args: Some(2),
        max_args: Some(2),
        arg_checks: &[
            ArgCheck { index: 0, accepts: STRING },
            ArgCheck { index: 1, accepts: STRING },
        ],
        ..step(StepKind::Has, "Has")
    },
    // Tagging
    StepDescriptor {
        aliases: &["As"],
        min_args: Some(1),
        max_args: Some(1),
        arg_checks: &[ArgCheck { index: 0, accepts: LABELS }],
        tag_rule: TagRule::Arg(0),
        ..step(StepKind::Tag, "Tag")
    },
    StepDescriptor {
        min_args: Some(2),
        max_args: Some(2),
        arg_checks: &[
            ArgCheck { index: 0, accepts: STRING },
            ArgCheck { index: 1, accepts: STRING },
        ],
        tag_rule: TagRule::Arg(1),
        ..step(StepKind::Save, "Save")
    },
    StepDescriptor {
        min_args: Some(1),
        max_args: Some(1),
        tag_rule: TagRule::Arg(0),
        ..step(StepKind::Back, "Back")
    },
    // Morphisms
    StepDescriptor {
        min_args: Some(1),
        max_args: Some(1),
        requires_morphism: &[0],
        ..step(StepKind::Follow, "Follow")
    },
    StepDescriptor {
        min_args: Some(1),
        max_args: Some(1),
        requires_morphism: &[0],
        ..step(StepKind::FollowR, "FollowR")
    },
    // Joins
    StepDescriptor {
        aliases: &["And"],
        min_args: Some(1),
        max_args: Some(1),
        arg_checks: &[ArgCheck { index: 0, accepts: CHAIN }],
        ..step(StepKind::Intersect, "Intersect")
    },
    StepDescriptor {
        aliases: &["Or"],
        min_args: Some(1),
        max_args: Some(1),
        arg_checks: &[ArgCheck { index: 0, accepts: CHAIN }],
        ..step(StepKind::Union, "Union")
    },
    // Terminals
    StepDescriptor {
        max_args: Some(0),
        terminal: true,
        ..step(StepKind::All, "All")
    },
    StepDescriptor {
        min_args: Some(1),
        max_args: Some(1),
        arg_checks: &[ArgCheck { index: 0, accepts: INTEGER }],
        terminal: true,
        ..step(StepKind::GetLimit, "GetLimit")
    },
];

impl StepKind {
    pub fn descriptor(self) -> &'static StepDescriptor {
        STEPS
            .iter()
            .find(|d| d.kind == self)
            .unwrap_or_else(|| unreachable!("every StepKind has a row in STEPS"))
    }
}

fn by_name() -> &'static HashMap<&'static str, &'static StepDescriptor> {
    static TABLE: OnceLock<HashMap<&'static str, &'static StepDescriptor>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::new();
        for d in STEPS.iter().filter(|d| !d.root_only) {
            table.insert(d.name, d);
            for alias in d.aliases {
                table.insert(*alias, d);
            }
        }
        table
    })
}

/// Resolve a step by name or alias.
///
/// Root kinds fail with `RootOnlyStep`; anything else unknown with
/// `UnknownStep`.
pub fn lookup(name: &str) -> Result<&'static StepDescriptor, UsageError> {
    if let Some(d) = by_name().get(name).copied() {
        return Ok(d);
    }
    match STEPS
        .iter()
        .find(|d| d.root_only && (d.name == name || d.aliases.iter().any(|a| *a == name)))
    {
        Some(root) => Err(UsageError::RootOnlyStep(root.name)),
        None => Err(UsageError::UnknownStep(name.to_string())),
    }
}

/// All names (including aliases) that can be chained to.
pub fn chainable_names() -> Vec<&'static str> {
    let mut names: Vec<_> = by_name().keys().copied().collect();
    names.sort_unstable();
    names
}
