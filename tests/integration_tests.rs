//! End-to-end tests over a real socket.
//!
//! A one-thread HTTP stub stands in for the Cayley endpoint: it records each
//! request line and body and answers with canned replies, one per connection.
//!
//! Run with: cargo test --test integration_tests

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use cayley_gremlin::freebase::{lang_en, rdf};
use cayley_gremlin::{GremlinError, Graph, Settings, TransportError};

#[derive(Debug)]
struct Seen {
    request_line: String,
    content_type: Option<String>,
    body: String,
}

/// Serve `replies` in order, one connection each, then stop.
fn stub_server(replies: Vec<(u16, String)>) -> (u16, mpsc::Receiver<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
    let port = listener.local_addr().expect("local addr").port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in replies {
            let (stream, _) = listener.accept().expect("accept");
            let seen = handle(stream, status, &body);
            if tx.send(seen).is_err() {
                return;
            }
        }
    });
    (port, rx)
}

fn handle(stream: TcpStream, status: u16, reply: &str) -> Seen {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .ok();
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");

    let mut content_length = 0usize;
    let mut content_type = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().expect("content-length"),
                "content-type" => content_type = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("body");

    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
        reply.len()
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes()).expect("write reply");
    stream.flush().ok();

    Seen {
        request_line: request_line.trim_end().to_string(),
        content_type,
        body: String::from_utf8(body).expect("utf-8 body"),
    }
}

fn graph_for(port: u16) -> Graph {
    let settings = Settings::from_lookup(|key| match key {
        "CAYLEY_HOST" => Some("127.0.0.1".to_string()),
        "CAYLEY_PORT" => Some(port.to_string()),
        "CAYLEY_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .expect("settings");
    assert_eq!(
        settings.query_url(),
        format!("http://127.0.0.1:{port}/api/v1/query/gremlin")
    );
    Graph::from_settings(&settings).expect("graph")
}

#[test]
fn test_query_is_posted_once_and_parsed() {
    let reply = serde_json::json!({
        "result": [
            {"id": rdf("m.03j24kf"), "free_id": rdf("m.03j24kf")}
        ]
    })
    .to_string();
    let (port, seen) = stub_server(vec![(200, reply)]);
    let g = graph_for(port);

    let q = g
        .v(lang_en("Paul McCartney"))
        .in_(rdf("type.object.name"))
        .expect("in")
        .tag("free_id")
        .expect("tag")
        .all()
        .expect("all");

    let results = q.results().expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get("free_id"), Some(rdf("m.03j24kf").as_str()));

    // Second read is served from the cache; the stub would not answer again.
    assert_eq!(q.len().expect("cached len"), 1);

    let request = seen.recv_timeout(Duration::from_secs(5)).expect("request seen");
    assert_eq!(request.request_line, "POST /api/v1/query/gremlin HTTP/1.1");
    assert_eq!(request.body, q.to_query_string());
    assert!(request.content_type.is_none(), "body is sent as raw text");
    assert!(seen.try_recv().is_err());
}

#[test]
fn test_error_status_is_reported_with_server_message() {
    let (port, _seen) = stub_server(vec![(400, r#"{"error": "Unknown step Sideways"}"#.to_string())]);
    let g = graph_for(port);

    let q = g.v("x").all().expect("all");
    let err = q.results().unwrap_err();
    assert_eq!(
        err,
        GremlinError::Transport(TransportError::status(
            400,
            Some("Unknown step Sideways".to_string())
        ))
    );
    assert_eq!(err.to_string(), "Error(400) - Unknown step Sideways");
    assert_eq!(q.results().unwrap_err(), err);
}

#[test]
fn test_null_result_over_http_is_empty() {
    let (port, _seen) = stub_server(vec![(200, r#"{"result": null}"#.to_string())]);
    let g = graph_for(port);
    let q = g
        .v(lang_en("Paul McCartney"))
        .out(rdf("common.topic.alias"))
        .expect("out")
        .all()
        .expect("all");
    assert!(q.is_empty().expect("is_empty"));
}

#[test]
fn test_unreachable_endpoint_is_a_transport_failure() {
    // Bind and drop to get a port nothing listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let g = graph_for(port);
    let err = g.v("x").all().expect("all").results().unwrap_err();
    match err {
        GremlinError::Transport(t) => assert!(t.status.is_none(), "err={t}"),
        other => panic!("expected transport error, got {other}"),
    }
}
