//! End-to-end output tests.
//!
//! Runs a plan through `app::execute` with the mock connector and checks
//! the rendered text.

use std::sync::Arc;

use sqlfan::app::{execute, RunPlan};
use sqlfan::config::{Settings, Verbosity};
use sqlfan::db::{MockConnector, MockEndpoint, MockResult, Value};
use sqlfan::dsn::Endpoint;
use sqlfan::query::split_statements;

const DB1: &str = "ops:hunter2@tcp(db1:3306)/inventory";
const DB2: &str = "ops:hunter2@tcp(db2:3306)/inventory";

fn settings(table: bool, verbosity: u8) -> Settings {
    Settings {
        concurrent: true,
        table,
        verbosity: Verbosity::new(verbosity),
        color: false,
        my_cnf: None,
    }
}

async fn render(connector: MockConnector, sql: &str, settings: Settings) -> String {
    let plan = RunPlan {
        endpoints: vec![Endpoint::new(DB1), Endpoint::new(DB2)],
        statements: split_statements(sql),
        settings,
    };
    let out = execute(plan, Arc::new(connector), Vec::new()).await.unwrap();
    String::from_utf8(out).unwrap()
}

fn items() -> MockResult {
    MockResult::rows(
        &["sku", "qty"],
        vec![
            vec![Value::Bytes(b"A-1".to_vec()), Value::Int(3)],
            vec![Value::Bytes(b"B-22".to_vec()), Value::Null],
        ],
    )
}

#[tokio::test]
async fn test_bordered_run() {
    let connector = MockConnector::new()
        .with_endpoint(DB1, MockEndpoint::new().result("SELECT sku, qty FROM items", items()))
        .with_endpoint(DB2, MockEndpoint::new().connect_error("i/o timeout"));

    let text = render(connector, "SELECT sku, qty FROM items;", settings(true, 0)).await;

    let expected = "\
Executing statements on 2 instance(s) (concurrent: true)...
[ops:****@tcp(db1:3306)/inventory] SELECT sku, qty FROM items
+------+------+
| sku  | qty  |
+------+------+
| A-1  | 3    |
| B-22 | NULL |
+------+------+
---
[ops:****@tcp(db2:3306)/inventory] ERROR : Connection error: failed to open connection: i/o timeout
---
All executions complete.
";
    assert_eq!(text, expected);
}

#[tokio::test]
async fn test_vertical_run_with_row_counts() {
    let connector = MockConnector::new()
        .with_endpoint(DB1, MockEndpoint::new().result("SELECT sku, qty FROM items", items()))
        .with_endpoint(
            DB2,
            MockEndpoint::new().result(
                "SELECT sku, qty FROM items",
                MockResult::rows(&["sku", "qty"], Vec::new()),
            ),
        );

    let text = render(connector, "SELECT sku, qty FROM items\\G", settings(false, 2)).await;

    let stars = "*".repeat(20);
    let expected = format!(
        "\
Executing statements on 2 instance(s) (concurrent: true)...
--------------
[ops:****@tcp(db1:3306)/inventory] SELECT sku, qty FROM items\\G
{stars} 1. row {stars}
sku: A-1
qty: 3
{stars} 2. row {stars}
sku: B-22
qty: NULL
(2 rows in set)
---
--------------
[ops:****@tcp(db2:3306)/inventory] SELECT sku, qty FROM items\\G
Empty set.
(0 rows in set)
---
All executions complete.
"
    );
    assert_eq!(text, expected);
}

#[tokio::test]
async fn test_empty_set_keeps_header() {
    let empty = || MockResult::rows(&["sku", "qty"], Vec::new());
    let connector = MockConnector::new()
        .with_endpoint(DB1, MockEndpoint::new().result("SELECT sku, qty FROM items WHERE 0", empty()))
        .with_endpoint(DB2, MockEndpoint::new().result("SELECT sku, qty FROM items WHERE 0", empty()));

    let plain = render(connector.clone(), "SELECT sku, qty FROM items WHERE 0", settings(false, 0)).await;
    assert_eq!(plain.matches("sku\tqty\nEmpty set.\n---\n").count(), 2);
    assert!(!plain.contains("no columns returned"));

    let bordered = render(connector, "SELECT sku, qty FROM items WHERE 0", settings(true, 2)).await;
    assert_eq!(bordered.matches("Empty set.\n(0 rows in set)\n---\n").count(), 2);
    assert!(!bordered.contains("Query OK"));
}

#[tokio::test]
async fn test_passwords_never_printed() {
    let text = render(
        MockConnector::new(),
        "SELECT 1; UPDATE t SET a = 1",
        settings(false, 3),
    )
    .await;
    assert!(!text.contains("hunter2"));
    assert_eq!(text.matches("Statement executed successfully").count(), 2);
    assert_eq!(text.matches("Query time: ").count(), 4);
}
