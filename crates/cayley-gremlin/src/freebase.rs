//! Helpers for Freebase-style RDF values.
//!
//! Freebase dumps loaded into Cayley name entities by URI
//! (`http://rdf.freebase.com/ns/m.03j24kf`) and store strings as language
//! literals (`"Paul McCartney"@en`).

use std::sync::OnceLock;

use regex::Regex;

use crate::record::Record;

pub const RDF_PREFIX: &str = "http://rdf.freebase.com/ns/";
pub const DEFAULT_LANG: &str = "en";

/// `name` as a full Freebase URI.
pub fn rdf(name: &str) -> String {
    format!("{RDF_PREFIX}{name}")
}

/// `name` as a `"name"@lang` literal, with inner quotes escaped.
pub fn lang(name: &str, lang: &str) -> String {
    format!("\"{}\"@{lang}", name.replace('"', "\\\""))
}

pub fn lang_en(name: &str) -> String {
    lang(name, DEFAULT_LANG)
}

fn any_lang_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^"(.*)"@(.*)$"#).expect("static regex"))
}

/// Split `"text"@lang` into its text and language. Quotes in the text stay
/// escaped.
fn split_literal(value: &str) -> Option<(&str, &str)> {
    let caps = any_lang_literal().captures(value)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Strip the RDF prefix, or unwrap a literal in `lang`. Anything else is
/// returned unchanged.
pub fn clean(value: &str, lang: &str) -> String {
    if let Some(rest) = value.strip_prefix(RDF_PREFIX) {
        return rest.to_string();
    }
    match split_literal(value) {
        Some((text, l)) if l == lang => text.replace("\\\"", "\""),
        _ => value.to_string(),
    }
}

/// `clean` applied to every field.
pub fn clean_record(record: Record, lang: &str) -> Record {
    record.map_values(|v| clean(v, lang))
}

/// False when some field is a language literal in a language other than
/// `lang`.
pub fn matches_lang(record: &Record, lang: &str) -> bool {
    record.iter().all(|(_, v)| match split_literal(v) {
        Some((_, l)) => l == lang,
        None => true,
    })
}
