use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cayley_gremlin::freebase::{lang_en, rdf};
use cayley_gremlin::{
    GremlinError, Graph, Phase, Predicate, ProtocolError, RawResponse, Record, Transform,
    Transport, TransportError, UsageError,
};

/// Canned replies keyed by query string; counts every submission.
#[derive(Default)]
struct MockTransport {
    replies: HashMap<String, RawResponse>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockTransport {
    fn reply(mut self, query: &str, body: &str) -> Self {
        self.replies.insert(query.to_string(), RawResponse::ok(body));
        self
    }

    fn reply_status(mut self, query: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert(query.to_string(), RawResponse::new(status, body));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn submit(&self, query: &str) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        Ok(self
            .replies
            .get(query)
            .cloned()
            .unwrap_or_else(|| RawResponse::new(404, "")))
    }
}

fn graph(mock: MockTransport) -> (Graph, Arc<MockTransport>) {
    let mock = Arc::new(mock);
    let shared: Arc<dyn Transport> = mock.clone();
    (Graph::with_shared(shared), mock)
}

const PAUL_ALL: &str = r#"g.Vertex("\"Paul McCartney\"@en").All()"#;
const PAUL_IN: &str =
    r#"g.Vertex("\"Paul McCartney\"@en").In("http://rdf.freebase.com/ns/type.object.name").All()"#;
const PAUL_OUT: &str = r#"g.Vertex("\"Paul McCartney\"@en").Out("http://rdf.freebase.com/ns/common.topic.alias").All()"#;
const PAUL_IN_OUT: &str = r#"g.Vertex("\"Paul McCartney\"@en").In("http://rdf.freebase.com/ns/type.object.name").Out("http://rdf.freebase.com/ns/common.topic.alias").All()"#;
const PAUL_TAG: &str = r#"g.Vertex("\"Paul McCartney\"@en").In("http://rdf.freebase.com/ns/type.object.name").Tag("free_id").All()"#;

const ALIASES: &[&str] = &[
    r#""Paul McCartney's musical career"@en"#,
    r#""Sir James Paul McCartney, MBE"@en"#,
    r#""Bernard Webb"@en"#,
    r#""Wings"@en"#,
    r#""Sir Paul McCartney"@en"#,
    r#""Macca"@en"#,
    r#""James Paul McCartney"@en"#,
    r#""The Beatles"@en"#,
    r#""Paul"@en"#,
    r#""Sir James Paul McCartney"@en"#,
    r#""Percy Thrillington"@en"#,
    r#""Solo career of Paul McCartney"@en"#,
    r#""Percy \"Thrills\" Thrillington"@en"#,
    r#""Thrillington, Percy 'Thrills'"@en"#,
];

fn aliases_body() -> String {
    let items: Vec<serde_json::Value> = ALIASES
        .iter()
        .map(|a| serde_json::json!({ "id": a }))
        .collect();
    serde_json::json!({ "result": items }).to_string()
}

fn mock() -> MockTransport {
    MockTransport::default()
        .reply(PAUL_ALL, r#"{"result": [{"id": "\"Paul McCartney\"@en"}]}"#)
        .reply(
            PAUL_IN,
            r#"{"result": [{"id": "http://rdf.freebase.com/ns/m.03j24kf"}]}"#,
        )
        .reply(PAUL_OUT, r#"{"result": null}"#)
        .reply(PAUL_IN_OUT, &aliases_body())
        .reply(
            PAUL_TAG,
            r#"{"result": [{"free_id": "http://rdf.freebase.com/ns/m.03j24kf", "id": "http://rdf.freebase.com/ns/m.03j24kf"}]}"#,
        )
}

fn paul(g: &Graph) -> cayley_gremlin::Query {
    g.v(lang_en("Paul McCartney"))
}

#[test]
fn base_query() {
    let (g, _) = graph(mock());
    let q = paul(&g).all().unwrap();
    assert_eq!(q.first().unwrap().unwrap().id(), Some(r#""Paul McCartney"@en"#));
}

#[test]
fn in_query() {
    let (g, _) = graph(mock());
    let q = paul(&g).in_(rdf("type.object.name")).unwrap().all().unwrap();
    assert_eq!(
        q.results().unwrap()[0].id(),
        Some("http://rdf.freebase.com/ns/m.03j24kf")
    );
}

#[test]
fn null_result_is_an_empty_set() {
    let (g, _) = graph(mock());
    let q = paul(&g).out(rdf("common.topic.alias")).unwrap().all().unwrap();
    assert_eq!(q.len().unwrap(), 0);
    assert!(q.is_empty().unwrap());
    assert_eq!(q.phase(), Phase::Cached);
}

#[test]
fn in_out_preserves_server_order() {
    let (g, _) = graph(mock());
    let q = paul(&g)
        .in_(rdf("type.object.name"))
        .unwrap()
        .out(rdf("common.topic.alias"))
        .unwrap()
        .all()
        .unwrap();
    let results = q.results().unwrap();
    assert_eq!(results.len(), 14);
    for (pos, expected) in ALIASES.iter().enumerate() {
        assert_eq!(results[pos].id(), Some(*expected), "position {pos}");
    }
}

#[test]
fn tags_become_record_fields() {
    let (g, _) = graph(mock());
    let q = paul(&g)
        .in_(rdf("type.object.name"))
        .unwrap()
        .tag("free_id")
        .unwrap()
        .all()
        .unwrap();
    let results = q.results().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id(), Some("http://rdf.freebase.com/ns/m.03j24kf"));
    assert_eq!(results[0].get("free_id"), Some("http://rdf.freebase.com/ns/m.03j24kf"));
}

#[test]
fn executes_at_most_once() {
    let (g, mock) = graph(mock());
    let q = paul(&g).all().unwrap();
    assert_eq!(q.phase(), Phase::Unexecuted);
    assert_eq!(mock.calls(), 0);

    let first = q.results().unwrap();
    let _ = q.len().unwrap();
    let _ = q.get(0).unwrap();
    let again = q.results().unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(mock.calls(), 1);

    // Clones share the link and its cache.
    let clone = q.clone();
    assert_eq!(clone.len().unwrap(), 1);
    assert_eq!(mock.calls(), 1);
}

#[test]
fn concurrent_first_reads_issue_one_request() {
    let (g, mock) = graph(MockTransport {
        delay: Some(Duration::from_millis(50)),
        ..mock()
    });
    let q = paul(&g).all().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let q = q.clone();
            thread::spawn(move || q.len().unwrap())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 1);
    }
    assert_eq!(mock.calls(), 1);
}

#[test]
fn distinct_after_terminal_shares_the_request() {
    let body = r#"{"result": [{"id": "a"}, {"id": "b"}, {"id": "a"}, {"id": "c"}, {"id": "b"}]}"#;
    let (g, mock) = graph(MockTransport::default().reply(r#"g.Vertex("x").All()"#, body));

    let all = g.v("x").all().unwrap();
    let distinct = all.distinct();
    assert_eq!(distinct.to_query_string(), all.to_query_string());

    let ids: Vec<_> = distinct
        .results()
        .unwrap()
        .iter()
        .map(|r| r.id().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(distinct.results().unwrap().is_distinct());
    assert_eq!(all.len().unwrap(), 5);
    assert_eq!(mock.calls(), 1);
}

#[test]
fn operators_before_the_terminal_run_after_parsing() {
    let body = serde_json::json!({
        "result": [
            {"id": rdf("m.1"), "name": lang_en("Wings")},
            {"id": rdf("m.2"), "name": "\"Ailes\"@fr"},
            {"id": rdf("m.1"), "name": lang_en("Wings")},
        ]
    })
    .to_string();
    let (g, mock) = graph(
        MockTransport::default().reply(r#"g.Vertex("x").Out("name", "name").All()"#, &body),
    );

    let q = g
        .v("x")
        .out_tagged("name", "name")
        .unwrap()
        .filter(Predicate::Language("en".to_string()))
        .distinct()
        .all()
        .unwrap()
        .map(Transform::CleanRdf {
            lang: "en".to_string(),
        });

    let results = q.results().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id(), Some("m.1"));
    assert_eq!(results[0].get("name"), Some("Wings"));
    assert_eq!(mock.calls(), 1);
}

#[test]
fn custom_function_operators() {
    fn keep_even(r: &Record) -> bool {
        r.id().and_then(|id| id.parse::<u32>().ok()).is_some_and(|n| n % 2 == 0)
    }
    fn tag_it(r: Record) -> Record {
        r.map_values(|v| format!("n{v}"))
    }

    let body = r#"{"result": [{"id": "1"}, {"id": "2"}, {"id": "4"}]}"#;
    let (g, _) = graph(MockTransport::default().reply(r#"g.Vertex().All()"#, body));
    let q = g
        .vertex(vec![])
        .all()
        .unwrap()
        .filter(Predicate::Func(keep_even))
        .map(Transform::Func(tag_it));
    let ids: Vec<_> = q.to_vec().unwrap().into_iter().map(|r| r["id"].to_string()).collect();
    assert_eq!(ids, vec!["n2", "n4"]);
}

#[test]
fn non_terminal_chains_cannot_execute() {
    let (g, mock) = graph(mock());
    let err = paul(&g).in_("p").unwrap().results().unwrap_err();
    assert!(matches!(
        err,
        GremlinError::Usage(UsageError::NotExecutable { morphism: false, .. })
    ));

    let err = g.m().out("p").unwrap().len().unwrap_err();
    assert!(matches!(
        err,
        GremlinError::Usage(UsageError::NotExecutable { morphism: true, .. })
    ));
    assert_eq!(mock.calls(), 0);
}

#[test]
fn terminal_morphism_chain_can_execute() {
    let (g, mock) = graph(
        MockTransport::default().reply(r#"g.Morphism().Out("p").All()"#, r#"{"result": null}"#),
    );
    let q = g.m().out("p").unwrap().all().unwrap();
    assert!(q.is_morphism());
    assert_eq!(q.len().unwrap(), 0);
    assert_eq!(mock.calls(), 1);
}

#[test]
fn failures_are_sticky() {
    let (g, mock) = graph(MockTransport::default().reply_status(
        r#"g.Vertex("x").All()"#,
        400,
        r#"{"error": "bad"}"#,
    ));
    let q = g.v("x").all().unwrap();

    let err = q.results().unwrap_err();
    assert_eq!(
        err,
        GremlinError::Transport(TransportError::status(400, Some("bad".to_string())))
    );
    assert_eq!(q.phase(), Phase::Failed);
    assert_eq!(q.results().unwrap_err(), err);
    assert_eq!(mock.calls(), 1);

    // A freshly built chain tries again.
    assert!(g.v("x").all().unwrap().results().is_err());
    assert_eq!(mock.calls(), 2);
}

#[test]
fn unknown_query_is_a_404() {
    let (g, _) = graph(mock());
    let err = g.v("nobody").all().unwrap().results().unwrap_err();
    assert_eq!(err.to_string(), "Error(404)");
}

#[test]
fn record_missing_declared_tag_is_a_protocol_error() {
    let (g, _) = graph(MockTransport::default().reply(
        r#"g.Vertex("x").Save("p", "s").All()"#,
        r#"{"result": [{"id": "x"}]}"#,
    ));
    let err = g
        .v("x")
        .save("p", "s")
        .unwrap()
        .all()
        .unwrap()
        .results()
        .unwrap_err();
    assert!(matches!(
        err,
        GremlinError::Protocol(ProtocolError::MalformedRecord { index: 0, .. })
    ));
}
