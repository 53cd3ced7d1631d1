//! Simulates one request against an unconfigured repository and prints the
//! profiler snapshot as JSON.
//!
//! Run with: `cargo run -p phpcr-bundle --example profile_request`

use phpcr_bundle::{BundleConfig, ContentRepository, PhpcrBundle};
use phpcr_profiler::{RawParam, SqlQuery};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = BundleConfig::default();
    config.profiling.apply_env()?;

    let mut bundle = PhpcrBundle::boot(config)?;
    let repo = bundle.repository("default")?;

    let calls: Vec<(&str, Vec<RawParam>)> = vec![
        ("getNode", vec!["/cms/content/home".into()]),
        (
            "query",
            vec![SqlQuery::jcr_sql2("SELECT * FROM [nt:unstructured] WHERE title IS NOT NULL")
                .with_limit(20)
                .into()],
        ),
        ("storeBinary", vec![RawParam::resource("stream")]),
    ];
    for (method, params) in calls {
        if let Err(e) = repo.invoke(method, &params) {
            tracing::warn!("{}", e);
        }
    }

    let snapshot = bundle.finish_request();
    println!("{}", snapshot.to_json_pretty()?);
    println!(
        "{} calls, {:.3} ms total",
        snapshot.call_count(),
        snapshot.total_time_ms()
    );
    Ok(())
}
