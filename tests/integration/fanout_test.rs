//! Fan-out integration tests.
//!
//! Drives the splitter, coordinator and executor together against the
//! scripted mock connector.

use std::sync::Arc;
use std::time::Duration;

use sqlfan::config::Verbosity;
use sqlfan::db::{MockConnector, MockEndpoint, MockResult, Value};
use sqlfan::dsn::Endpoint;
use sqlfan::error::SqlfanError;
use sqlfan::query::{split_statements, Coordinator, EndpointReport, RunSession};

const DB1: &str = "app:pw@tcp(db1:3306)/shop";
const DB2: &str = "app:pw@tcp(db2:3306)/shop";
const DB3: &str = "app:pw@tcp(db3:3306)/shop";

fn session(endpoints: &[&str], sql: &str, concurrent: bool) -> RunSession {
    RunSession::new(
        endpoints.iter().map(|e| Endpoint::new(*e)).collect(),
        split_statements(sql),
        concurrent,
    )
}

fn endpoint_order(reports: &[EndpointReport]) -> Vec<&str> {
    reports.iter().map(|r| r.endpoint.as_str()).collect()
}

#[tokio::test]
async fn test_second_endpoint_unreachable() {
    for concurrent in [false, true] {
        let connector = Arc::new(
            MockConnector::new()
                .with_endpoint(DB2, MockEndpoint::new().connect_error("dial tcp: refused")),
        );
        let coordinator = Coordinator::new(connector, Verbosity::default());

        let reports = coordinator
            .collect(&session(&[DB1, DB2, DB3], "SELECT 1; SELECT 2", concurrent))
            .await;

        assert_eq!(endpoint_order(&reports), vec![DB1, DB2, DB3]);

        assert_eq!(reports[0].outcomes.len(), 2);
        assert_eq!(reports[2].outcomes.len(), 2);
        for report in [&reports[0], &reports[2]] {
            assert!(report.outcomes.iter().all(|o| !o.is_error()));
            assert_eq!(report.outcomes[0].statement, "SELECT 1");
            assert_eq!(report.outcomes[1].statement, "SELECT 2");
        }

        assert_eq!(reports[1].outcomes.len(), 1);
        let failure = &reports[1].outcomes[0];
        assert!(failure.statement.is_empty());
        assert!(matches!(failure.error, Some(SqlfanError::Connection(_))));
    }
}

#[tokio::test]
async fn test_first_statement_fails_second_succeeds() {
    let connector = Arc::new(MockConnector::new().with_endpoint(
        DB1,
        MockEndpoint::new().fail_statement(
            "SELECT * FROM missing",
            "ERROR 1146 (42S02): Table 'shop.missing' doesn't exist",
        ),
    ));
    let coordinator = Coordinator::new(connector, Verbosity::default());

    let reports = coordinator
        .collect(&session(&[DB1], "SELECT * FROM missing; SELECT 1;", false))
        .await;

    let outcomes = &reports[0].outcomes;
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(outcomes[0].error, Some(SqlfanError::Query(_))));
    assert!(outcomes[0].rows.is_empty());
    assert!(outcomes[1].error.is_none());
    assert_eq!(outcomes[1].rows.len(), 1);
}

/// Delay schedule for one round: a different permutation of `base` each time.
fn round_delays(base: &[u64], round: usize) -> Vec<u64> {
    // `base` has a prime length, so any step below it visits every slot once.
    let n = base.len();
    let step = round % 4 + 1;
    (0..n).map(|i| base[(i * step + round) % n]).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_results_follow_input_order() {
    let base = [35, 0, 20, 5, 10, 25, 15];
    let endpoints: Vec<String> = (0..base.len())
        .map(|i| format!("app:pw@tcp(db{i}:3306)/shop"))
        .collect();
    let names: Vec<&str> = endpoints.iter().map(String::as_str).collect();

    for round in 0..12 {
        let delays = round_delays(&base, round);
        let mut connector = MockConnector::new();
        for (endpoint, delay) in endpoints.iter().zip(&delays) {
            connector = connector.with_endpoint(
                endpoint.clone(),
                MockEndpoint::new().delay(Duration::from_millis(*delay)),
            );
        }
        let coordinator = Coordinator::new(Arc::new(connector), Verbosity::default());

        let reports = coordinator
            .collect(&session(&names, "SELECT 1; SELECT 2; SELECT 3", true))
            .await;

        assert_eq!(endpoint_order(&reports), names, "delays {delays:?}");
        for report in &reports {
            let statements: Vec<&str> = report
                .outcomes
                .iter()
                .map(|o| o.statement.as_str())
                .collect();
            assert_eq!(statements, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
        }
    }
}

#[test]
fn test_round_delays_are_permutations() {
    let base = [35, 0, 20, 5, 10, 25, 15];
    let mut seen = std::collections::HashSet::new();
    for round in 0..12 {
        let mut delays = round_delays(&base, round);
        seen.insert(delays.clone());
        delays.sort_unstable();
        let mut sorted = base.to_vec();
        sorted.sort_unstable();
        assert_eq!(delays, sorted);
    }
    assert!(seen.len() > 6);
}

#[tokio::test]
async fn test_vertical_statement_survives_fan_out() {
    let connector = Arc::new(MockConnector::new());
    let coordinator = Coordinator::new(connector, Verbosity::default());

    let reports = coordinator
        .collect(&session(
            &[DB1, DB2],
            "SELECT 1; SELECT 'a;b'; -- c;d\nSELECT 2\\G",
            true,
        ))
        .await;

    for report in &reports {
        assert_eq!(report.outcomes.len(), 3);
        let last = &report.outcomes[2];
        assert!(last.vertical);
        assert!(last.statement.ends_with("SELECT 2\\G"));
    }
}

#[tokio::test]
async fn test_crashing_endpoint_does_not_take_down_the_run() {
    let connector = Arc::new(MockConnector::new().with_endpoint(DB2, MockEndpoint::new().panics()));
    let coordinator = Coordinator::new(connector.clone(), Verbosity::default());

    let reports = coordinator
        .collect(&session(&[DB1, DB2, DB3], "SELECT 1", true))
        .await;

    assert_eq!(endpoint_order(&reports), vec![DB1, DB2, DB3]);
    assert!(matches!(
        reports[1].outcomes[0].error,
        Some(SqlfanError::Worker(_))
    ));
    assert!(reports[0].outcomes[0].error.is_none());
    assert!(reports[2].outcomes[0].error.is_none());
    assert_eq!(connector.open_cursors(), 0);
}

#[tokio::test]
async fn test_rows_and_errors_per_endpoint() {
    let good = MockResult::rows(
        &["id", "name"],
        vec![
            vec![Value::Int(1), Value::Bytes(b"alice".to_vec())],
            vec![Value::Int(2), Value::Null],
        ],
    );
    let partial = MockResult::rows(&["id", "name"], vec![vec![Value::Int(1), Value::Null]])
        .with_bad_row("invalid length");

    let connector = Arc::new(
        MockConnector::new()
            .with_endpoint(DB1, MockEndpoint::new().result("SELECT id, name FROM users", good))
            .with_endpoint(DB2, MockEndpoint::new().result("SELECT id, name FROM users", partial)),
    );
    let coordinator = Coordinator::new(connector, Verbosity::new(2));

    let reports = coordinator
        .collect(&session(&[DB1, DB2], "SELECT id, name FROM users", true))
        .await;

    let first = &reports[0].outcomes[0];
    assert_eq!(first.row_count, Some(2));
    assert_eq!(first.rows[0][1], Value::Text("alice".to_string()));
    assert!(first.rows[1][1].is_null());

    let second = &reports[1].outcomes[0];
    assert_eq!(second.row_count, Some(1));
    assert_eq!(second.error, Some(SqlfanError::row_decode("invalid length")));
}

#[tokio::test]
async fn test_duplicate_endpoints_each_run() {
    let connector = Arc::new(MockConnector::new());
    let coordinator = Coordinator::new(connector.clone(), Verbosity::default());

    let reports = coordinator
        .collect(&session(&[DB1, DB1, DB1], "SELECT 1; SELECT 2", true))
        .await;

    assert_eq!(reports.len(), 3);
    assert_eq!(
        reports.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(reports.iter().all(|r| r.outcomes.len() == 2));
    assert_eq!(connector.executed().len(), 6);
    assert_eq!(connector.closed_connections(), 3);
}
