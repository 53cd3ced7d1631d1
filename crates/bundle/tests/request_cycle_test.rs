//! Full request cycle through the booted bundle
//!
//! Run with: `cargo test -p phpcr-bundle --test request_cycle_test`

use phpcr_bundle::*;
use phpcr_profiler::{RawParam, SqlQuery};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

/// Backend that answers every call with an empty result
struct MemoryBackend;

impl ContentRepository for MemoryBackend {
    fn login(&self) -> Result<Option<Session>, RepositoryError> {
        Ok(Some(Session {
            workspace: "default".to_string(),
            user_id: None,
        }))
    }

    fn invoke(&self, _method: &str, _params: &[RawParam]) -> Result<Value, RepositoryError> {
        Ok(json!([]))
    }
}

fn config() -> BundleConfig {
    BundleConfig::from_json_str(
        r#"{
            "connections": [
                {"name": "default", "workspace": "live"},
                {"name": "secondary"}
            ],
            "managers": [
                {"name": "default", "documents": ["App\\Document\\Page", "App\\Document\\Menu"]},
                {"name": "secondary", "connection": "secondary"}
            ],
            "profiling": {"max_depth": 2}
        }"#,
    )
    .unwrap()
}

#[test]
fn test_request_cycle() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut bundle = PhpcrBundle::builder(config())
        .with_backend("default", Arc::new(MemoryBackend))?
        .boot()?;

    let repo = bundle.manager_repository("default")?;
    assert!(repo.login()?.is_some());
    repo.invoke(
        "query",
        &[SqlQuery::jcr_sql2("SELECT * FROM [nt:unstructured]")
            .with_limit(10)
            .with_offset(5)
            .into()],
    )?;
    repo.invoke("getNodes", &[RawParam::from(vec!["/cms/a", "/cms/b"])])?;
    bundle.load_metadata("default", "App\\Document\\Page")?;

    let snapshot = bundle.finish_request();

    let connections: Vec<&str> = snapshot.connections.iter().map(|c| c.as_str()).collect();
    assert_eq!(connections, vec!["default", "secondary"]);
    assert_eq!(snapshot.call_count(), 2);
    assert!(snapshot.calls["secondary"].is_empty());

    let calls = &snapshot.calls["default"];
    assert_eq!(calls[0].method(), "query");
    assert_eq!(
        calls[0].params()[0].value,
        json!({
            "querystring": "SELECT * FROM [nt:unstructured]",
            "language": "JCR-SQL2",
            "limit": 10,
            "offset": 5
        })
    );
    assert!(!calls[0].is_replayable());
    assert!(calls[1].is_replayable());
    assert_eq!(calls[1].env().get("workspace"), Some(&json!("live")));

    let documents: Vec<&str> = snapshot.documents["default"]
        .iter()
        .map(|c| c.as_str())
        .collect();
    assert_eq!(documents, vec!["App\\Document\\Page"]);
    assert!(snapshot.documents["secondary"].is_empty());

    // Reset happened; the loggers are empty for the next request
    assert_eq!(bundle.collector().call_count(), 0);
    assert_eq!(bundle.logger("default").map(|s| s.len()), Some(0));

    Ok(())
}

#[test]
fn test_unconfigured_connection_fails_but_is_profiled() -> anyhow::Result<()> {
    let mut bundle = PhpcrBundle::boot(config())?;

    let repo = bundle.repository("secondary")?;
    assert_eq!(repo.login()?, None);
    let err = repo.invoke("getNode", &["/cms".into()]).unwrap_err();
    assert!(matches!(err, RepositoryError::NotConfigured { .. }));

    let snapshot = bundle.finish_request();
    assert_eq!(snapshot.call_count(), 1);
    assert_eq!(snapshot.calls["secondary"][0].method(), "getNode");
    Ok(())
}

#[test]
fn test_configured_depth_limit_applies() -> anyhow::Result<()> {
    let mut bundle = PhpcrBundle::builder(config())
        .with_backend("default", Arc::new(MemoryBackend))?
        .boot()?;

    let nested = RawParam::from(vec![RawParam::from(vec![RawParam::from(vec![1, 2])])]);
    bundle.repository("default")?.invoke("importXML", &[nested])?;

    let snapshot = bundle.finish_request();
    let param = &snapshot.calls["default"][0].params()[0];
    assert!(!param.original);
    assert_eq!(param.value, json!([["Array(max depth 2 exceeded)"]]));
    Ok(())
}
