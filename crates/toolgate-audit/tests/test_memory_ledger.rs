use chrono::{Duration, Utc};
use toolgate_audit::{AuditLedger, AuditQuery, MemoryLedger};
use toolgate_core::{AuditRecord, DecisionKind};
use uuid::Uuid;

fn record(tool: &str, kind: DecisionKind, offset_secs: i64) -> AuditRecord {
    AuditRecord {
        id: Uuid::new_v4(),
        tool: tool.to_string(),
        decision_kind: kind,
        always_allowed: false,
        context: format!("{} invocation", tool),
        timestamp: Utc::now() + Duration::seconds(offset_secs),
    }
}

#[tokio::test]
async fn test_append_and_query_all() {
    let ledger = MemoryLedger::new();
    ledger.append(&record("send_email", DecisionKind::Approved, 0)).await.unwrap();
    ledger.append(&record("read_email", DecisionKind::AutoAllowed, 1)).await.unwrap();

    let all = ledger.query(&AuditQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_query_filters_by_tool() {
    let ledger = MemoryLedger::new();
    ledger.append(&record("send_email", DecisionKind::Approved, 0)).await.unwrap();
    ledger.append(&record("read_email", DecisionKind::AutoAllowed, 1)).await.unwrap();

    let query = AuditQuery {
        tool: Some("send_email".into()),
        ..Default::default()
    };
    let matched = ledger.query(&query).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].tool, "send_email");
}

#[tokio::test]
async fn test_query_filters_by_decision_kind() {
    let ledger = MemoryLedger::new();
    ledger.append(&record("send_email", DecisionKind::Approved, 0)).await.unwrap();
    ledger.append(&record("send_email", DecisionKind::Denied, 1)).await.unwrap();
    ledger.append(&record("send_email", DecisionKind::TimedOut, 2)).await.unwrap();

    let query = AuditQuery {
        decision_kind: Some(DecisionKind::Denied),
        ..Default::default()
    };
    let matched = ledger.query(&query).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].decision_kind, DecisionKind::Denied);
}

#[tokio::test]
async fn test_query_filters_by_time_range() {
    let ledger = MemoryLedger::new();
    let early = record("send_email", DecisionKind::Approved, -100);
    let late = record("send_email", DecisionKind::Approved, 100);
    ledger.append(&early).await.unwrap();
    ledger.append(&late).await.unwrap();

    let query = AuditQuery {
        from: Some(Utc::now() - Duration::seconds(10)),
        to: Some(Utc::now() + Duration::seconds(200)),
        ..Default::default()
    };
    let matched = ledger.query(&query).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, late.id);
}

#[tokio::test]
async fn test_query_orders_by_timestamp() {
    let ledger = MemoryLedger::new();
    ledger.append(&record("c", DecisionKind::Approved, 30)).await.unwrap();
    ledger.append(&record("a", DecisionKind::Approved, 10)).await.unwrap();
    ledger.append(&record("b", DecisionKind::Approved, 20)).await.unwrap();

    let all = ledger.query(&AuditQuery::default()).await.unwrap();
    assert_eq!(all[0].tool, "a");
    assert_eq!(all[1].tool, "b");
    assert_eq!(all[2].tool, "c");
}

#[tokio::test]
async fn test_equal_timestamps_keep_insertion_order() {
    let ledger = MemoryLedger::new();
    let ts = Utc::now();
    for tool in ["first", "second", "third"] {
        let mut r = record(tool, DecisionKind::Approved, 0);
        r.timestamp = ts;
        ledger.append(&r).await.unwrap();
    }

    let all = ledger.query(&AuditQuery::default()).await.unwrap();
    let tools: Vec<&str> = all.iter().map(|r| r.tool.as_str()).collect();
    assert_eq!(tools, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_concurrent_appends_lose_nothing() {
    let ledger = std::sync::Arc::new(MemoryLedger::new());
    let mut handles = Vec::new();
    for i in 0..32 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger
                .append(&record(&format!("tool_{}", i), DecisionKind::Approved, i))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(ledger.len(), 32);
}
