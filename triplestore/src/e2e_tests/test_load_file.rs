//! Loading N-Triples documents from disk through a connection.

use std::io::Write;

use crate::config::EngineConfig;
use crate::connection::{ConnectionFactory, Load, SessionError};
use crate::content::{Content, ContentError};
use crate::e2e_tests::helpers::{pattern, uri};
use crate::query::Query;
use crate::store::DEFAULT_GRAPH;
use crate::types::{Literal, Term};

fn document(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".nt")
        .tempfile()
        .expect("create temp file");
    file.write_all(text.as_bytes()).expect("write document");
    file.flush().expect("flush document");
    file
}

#[test]
fn test_load_then_query() {
    let file = document(
        "# people\n\
         <http://example.org/ann> <http://example.org/knows> <http://example.org/ben> .\n\
         <http://example.org/ann> <http://example.org/name> \"Ann\"@en .\n\
         \n\
         <http://example.org/ben> <http://example.org/age> \"34\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n\
         <http://example.org/ann> <http://example.org/knows> <http://example.org/ben> .\n",
    );
    let factory = ConnectionFactory::new(&EngineConfig::default());
    let connection = factory.connect("local:loaded").expect("connect");

    let load = Load::new(DEFAULT_GRAPH, Content::from_path(file.path()));
    assert_eq!(connection.execute(&load).expect("load"), 3);

    let mut answer = connection
        .execute(&Query::select_all(pattern("ann", "name", "?name")))
        .expect("query");
    assert!(answer.next().expect("next"));
    assert_eq!(
        answer.get_by_name("name").expect("get"),
        Some(Term::Literal(Literal::lang_tagged("Ann", "en")))
    );
    answer.close().expect("close");

    let mut answer = connection
        .execute(&Query::select_all(pattern("?who", "age", "?age")))
        .expect("query");
    assert!(answer.next().expect("next"));
    assert_eq!(answer.get_by_name("who").expect("get"), Some(uri("ben")));
    answer.close().expect("close");
}

#[test]
fn test_syntax_error_loads_nothing() {
    let file = document(
        "<http://example.org/a> <http://example.org/p> <http://example.org/b> .\n\
         <http://example.org/a> <http://example.org/p> .\n",
    );
    let factory = ConnectionFactory::new(&EngineConfig::default());
    let connection = factory.connect("local:broken").expect("connect");

    let err = connection
        .execute(&Load::new(DEFAULT_GRAPH, Content::from_path(file.path())))
        .expect_err("syntax error");
    assert!(matches!(
        err,
        SessionError::Content(ContentError::Syntax { line: 2, .. })
    ));
    assert!(!connection
        .session()
        .contains(DEFAULT_GRAPH, None, None, None)
        .expect("contains"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let factory = ConnectionFactory::new(&EngineConfig::default());
    let connection = factory.connect("local:missing").expect("connect");
    let err = connection
        .execute(&Load::new(
            DEFAULT_GRAPH,
            Content::from_path(dir.path().join("absent.nt")),
        ))
        .expect_err("missing file");
    assert!(matches!(err, SessionError::Content(ContentError::Io { .. })));
}
