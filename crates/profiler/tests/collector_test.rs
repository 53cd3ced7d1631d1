//! End-to-end behavior of the data collector over a request cycle

use phpcr_profiler::prelude::*;
use phpcr_profiler::NamedObject;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

/// Registry with fixed connections and managers
struct TestRegistry {
    connections: Vec<&'static str>,
    managers: Vec<(&'static str, Vec<&'static str>)>,
}

impl ManagerRegistry for TestRegistry {
    fn connection_names(&self) -> Vec<ConnectionName> {
        self.connections
            .iter()
            .map(|c| ConnectionName::new(*c).unwrap())
            .collect()
    }

    fn manager_names(&self) -> Vec<ManagerName> {
        self.managers
            .iter()
            .map(|(m, _)| ManagerName::new(*m).unwrap())
            .collect()
    }

    fn loaded_metadata(&self, manager: &ManagerName) -> Result<Vec<ClassName>, RegistryError> {
        self.managers
            .iter()
            .find(|(m, _)| *m == manager.as_str())
            .map(|(_, classes)| {
                classes
                    .iter()
                    .map(|c| ClassName::parse(c).unwrap())
                    .collect()
            })
            .ok_or_else(|| RegistryError::UnknownManager(manager.to_string()))
    }
}

fn two_connections() -> Arc<TestRegistry> {
    Arc::new(TestRegistry {
        connections: vec!["default", "secondary"],
        managers: vec![("default", vec!["App\\Document\\Page", "App\\Document\\Menu"])],
    })
}

fn stack_with_calls(name: &str, durations: &[f64]) -> DebugStack {
    let stack = DebugStack::new(name);
    for (i, ms) in durations.iter().enumerate() {
        stack.push(
            CallEntry::new("getNode")
                .with_params([format!("/cms/node-{}", i)])
                .took(*ms),
        );
    }
    stack
}

#[test]
fn test_single_query_scenario() {
    let default = DebugStack::new("default");
    let secondary = DebugStack::new("secondary");

    let mut collector = DataCollector::new(two_connections());
    collector.attach_logger("default", Arc::new(default.clone()));
    collector.attach_logger("secondary", Arc::new(secondary));

    default.push(
        CallEntry::new("query")
            .with_params([RawParam::from(SqlQuery::new("SELECT * FROM x", "JCR-SQL2"))])
            .took(12.5),
    );

    collector.collect();

    let connections: Vec<&str> = collector.connections().iter().map(|c| c.as_str()).collect();
    assert_eq!(connections, vec!["default", "secondary"]);

    let default_calls = &collector.calls()["default"];
    assert_eq!(default_calls.len(), 1);
    assert_eq!(default_calls[0].params().len(), 1);
    assert_eq!(
        default_calls[0].params()[0],
        SanitizedValue {
            value: json!({"querystring": "SELECT * FROM x", "language": "JCR-SQL2"}),
            original: false,
        }
    );
    assert!(collector.calls()["secondary"].is_empty());
    assert_eq!(collector.call_count(), 1);
    assert_eq!(collector.total_time_ms(), 12.5);

    let documents: Vec<&str> = collector.documents()["default"]
        .iter()
        .map(|c| c.as_str())
        .collect();
    assert_eq!(documents, vec!["App\\Document\\Page", "App\\Document\\Menu"]);
}

#[test]
fn test_call_count_and_total_time_sum_over_connections() {
    let mut collector = DataCollector::new(two_connections());
    collector.attach_logger(
        "default",
        Arc::new(stack_with_calls("default", &[1.0, 2.5, 3.25])),
    );
    collector.attach_logger(
        "secondary",
        Arc::new(stack_with_calls("secondary", &[0.5, 0.5, 4.0, 10.0, 0.25])),
    );

    collector.collect();

    assert_eq!(collector.call_count(), 8);
    assert_eq!(collector.total_time_ms(), 1.0 + 2.5 + 3.25 + 0.5 + 0.5 + 4.0 + 10.0 + 0.25);
}

#[test]
fn test_calls_keep_recording_order() {
    let mut collector = DataCollector::new(two_connections());
    collector.attach_logger(
        "default",
        Arc::new(stack_with_calls("default", &[3.0, 1.0, 2.0])),
    );
    collector.collect();

    let paths: Vec<&serde_json::Value> = collector.calls()["default"]
        .iter()
        .map(|call| &call.params()[0].value)
        .collect();
    assert_eq!(
        paths,
        vec![&json!("/cms/node-0"), &json!("/cms/node-1"), &json!("/cms/node-2")]
    );
}

#[test]
fn test_reset_clears_snapshot_and_loggers() {
    let default = stack_with_calls("default", &[1.0, 2.0]);
    let secondary = stack_with_calls("secondary", &[3.0]);

    let mut collector = DataCollector::new(two_connections());
    collector.attach_logger("default", Arc::new(default.clone()));
    collector.attach_logger("secondary", Arc::new(secondary.clone()));
    collector.collect();
    assert_eq!(collector.call_count(), 3);

    collector.reset();

    assert!(collector.connections().is_empty());
    assert!(collector.managers().is_empty());
    assert!(collector.calls().is_empty());
    assert!(collector.documents().is_empty());
    assert_eq!(collector.call_count(), 0);
    assert_eq!(collector.total_time_ms(), 0.0);

    for stack in [&default, &secondary] {
        assert!(stack.is_empty());
        assert_eq!(stack.current_index(), 0);
    }

    // Idempotent, and fine without a prior collect
    collector.reset();
    let mut fresh = DataCollector::new(two_connections());
    fresh.reset();
    assert!(fresh.snapshot().is_empty());
}

#[test]
fn test_collect_twice_yields_same_snapshot() {
    let mut collector = DataCollector::new(two_connections());
    collector.attach_logger(
        "default",
        Arc::new(stack_with_calls("default", &[1.0, 2.0])),
    );

    collector.collect();
    let first = collector.snapshot().clone();
    collector.collect();

    assert_eq!(&first, collector.snapshot());
}

#[test]
fn test_next_request_starts_clean() {
    let default = DebugStack::new("default");
    let mut collector = DataCollector::new(two_connections());
    collector.attach_logger("default", Arc::new(default.clone()));

    default.push(CallEntry::new("getNode").took(1.0));
    collector.collect();
    collector.reset();

    default.push(CallEntry::new("getNodes").took(2.0));
    collector.collect();

    assert_eq!(collector.call_count(), 1);
    assert_eq!(collector.calls()["default"][0].method(), "getNodes");
}

#[test]
fn test_snapshot_json_shape() -> anyhow::Result<()> {
    let default = DebugStack::new("default");
    default.push(
        CallEntry::new("storeNodes")
            .with_params([
                RawParam::object(NamedObject("Jackalope\\Node".to_string())),
                RawParam::resource("stream"),
            ])
            .with_env("workspace", "default")
            .took(7.0),
    );

    let mut collector = DataCollector::new(two_connections());
    collector.attach_logger("default", Arc::new(default));
    collector.collect();

    let json: serde_json::Value = serde_json::from_str(&collector.snapshot().to_json()?)?;
    assert_eq!(json["connections"], json!(["default", "secondary"]));
    assert_eq!(json["managers"], json!(["default"]));
    assert_eq!(
        json["documents"],
        json!({"default": ["App\\Document\\Page", "App\\Document\\Menu"]})
    );

    let call = &json["calls"]["default"][0];
    assert_eq!(call["method"], json!("storeNodes"));
    assert_eq!(call["execution_ms"], json!(7.0));
    assert_eq!(call["env"], json!({"workspace": "default"}));
    assert_eq!(
        call["params"],
        json!([
            {"value": "Object(Jackalope\\Node)", "original": false},
            {"value": "Resource(stream)", "original": false}
        ])
    );

    let restored: Snapshot = serde_json::from_str(&collector.snapshot().to_json_pretty()?)?;
    assert_eq!(&restored, collector.snapshot());

    Ok(())
}
