//! Connections opened by URI share databases by name.

use crate::config::EngineConfig;
use crate::connection::{ConnectionFactory, SessionError};
use crate::e2e_tests::helpers::{pattern, statement, uri};
use crate::query::{AskQuery, Query};
use crate::store::DEFAULT_GRAPH;

#[test]
fn test_same_name_same_data() {
    let factory = ConnectionFactory::new(&EngineConfig::default());
    let writer = factory.connect("local:shared").expect("connect");
    writer
        .session()
        .insert(DEFAULT_GRAPH, &[statement("a", "p", "b")])
        .expect("insert");

    let other = ConnectionFactory::new(&EngineConfig::default());
    let isolated = other.connect("local:shared").expect("connect");
    let ask = AskQuery::new(pattern("a", "p", "?o"));
    assert!(!isolated.execute(&ask).expect("ask").value());

    let reader = factory.connect("local:shared").expect("connect");
    assert!(reader.execute(&ask).expect("ask").value());
    let unrelated = factory.connect("local:elsewhere").expect("connect");
    assert!(!unrelated.execute(&ask).expect("ask").value());
}

#[test]
fn test_named_graphs_through_a_session() {
    let factory = ConnectionFactory::new(&EngineConfig::default());
    let connection = factory.connect("local:graphs").expect("connect");
    let session = connection.session();
    let graph = "http://example.org/graphs/g1";

    assert!(session.create_graph(graph).expect("create"));
    assert_eq!(
        session
            .insert(graph, &[statement("a", "p", "b"), statement("a", "p", "c")])
            .expect("insert"),
        2
    );
    let query = Query::select_all(pattern("a", "p", "?o")).in_graph(crate::types::Term::uri(graph));
    let mut answer = connection.execute(&query).expect("query");
    assert_eq!(answer.row_count().expect("count"), 2);
    answer.close().expect("close");

    let mut found = session
        .find(graph, None, None, Some(&uri("c")))
        .expect("find");
    assert_eq!(found.row_count().expect("count"), 1);
    found.close().expect("close");

    assert!(session.remove_graph(graph).expect("remove"));
    assert!(!session.graph_exists(graph).expect("exists"));
}

#[test]
fn test_close_all_then_reconnect() {
    let factory = ConnectionFactory::new(&EngineConfig::default());
    let first = factory.connect("local:cycle").expect("connect");
    first
        .session()
        .insert(DEFAULT_GRAPH, &[statement("a", "p", "b")])
        .expect("insert");
    factory.close_all().expect("close all");
    assert!(matches!(
        first.execute(&AskQuery::new(pattern("a", "p", "?o"))),
        Err(SessionError::Closed)
    ));

    let second = factory.connect("local:cycle").expect("reconnect");
    assert!(second
        .execute(&AskQuery::new(pattern("a", "p", "?o")))
        .expect("ask")
        .value());
}
