//! Client-side operators, applied locally after the server has answered.
//!
//! Operators are never serialized. They accumulate along a chain (root first)
//! and run in that order over the parsed result set, before it is cached.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use crate::freebase;
use crate::record::{Record, ResultSet};

#[derive(Debug, Clone)]
pub enum ClientOp {
    /// Drop repeated records, keeping the first occurrence.
    Distinct,
    Filter(Predicate),
    Map(Transform),
}

#[derive(Clone)]
pub enum Predicate {
    TagEquals { tag: String, value: String },
    TagMatches { tag: String, pattern: Regex },
    /// No field is a language literal in another language.
    Language(String),
    Not(Box<Predicate>),
    Func(fn(&Record) -> bool),
}

#[derive(Clone)]
pub enum Transform {
    /// Strip the Freebase RDF prefix and unwrap `"..."@lang` literals.
    CleanRdf { lang: String },
    Func(fn(Record) -> Record),
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::TagEquals { tag, value } => write!(f, "TagEquals({tag} == {value:?})"),
            Predicate::TagMatches { tag, pattern } => {
                write!(f, "TagMatches({tag} ~ /{}/)", pattern.as_str())
            }
            Predicate::Language(lang) => write!(f, "Language({lang})"),
            Predicate::Not(inner) => write!(f, "Not({inner:?})"),
            Predicate::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::CleanRdf { lang } => write!(f, "CleanRdf({lang})"),
            Transform::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::TagEquals { tag, value } => record.get(tag) == Some(value.as_str()),
            Predicate::TagMatches { tag, pattern } => {
                record.get(tag).is_some_and(|v| pattern.is_match(v))
            }
            Predicate::Language(lang) => freebase::matches_lang(record, lang),
            Predicate::Not(inner) => !inner.matches(record),
            Predicate::Func(f) => f(record),
        }
    }
}

impl Transform {
    pub fn apply(&self, record: Record) -> Record {
        match self {
            Transform::CleanRdf { lang } => freebase::clean_record(record, lang),
            Transform::Func(f) => f(record),
        }
    }
}

impl ClientOp {
    pub fn name(&self) -> &'static str {
        match self {
            ClientOp::Distinct => "distinct",
            ClientOp::Filter(_) => "filter",
            ClientOp::Map(_) => "map",
        }
    }

    pub fn apply(&self, set: ResultSet) -> ResultSet {
        let (records, distinct) = set.into_parts();
        match self {
            ClientOp::Distinct => {
                let mut seen = HashSet::with_capacity(records.len());
                let kept = records
                    .into_iter()
                    .filter(|r| seen.insert(r.clone()))
                    .collect();
                ResultSet::from_parts(kept, true)
            }
            ClientOp::Filter(pred) => ResultSet::from_parts(
                records.into_iter().filter(|r| pred.matches(r)).collect(),
                distinct,
            ),
            ClientOp::Map(transform) => {
                let mapped: Vec<Record> = records.into_iter().map(|r| transform.apply(r)).collect();
                // A transform may fold two distinct records into one.
                if distinct {
                    ClientOp::Distinct.apply(ResultSet::new(mapped))
                } else {
                    ResultSet::new(mapped)
                }
            }
        }
    }
}

/// Run `ops` in order over `set`.
pub fn apply_all(ops: &[ClientOp], set: ResultSet) -> ResultSet {
    ops.iter().fold(set, |acc, op| op.apply(acc))
}
