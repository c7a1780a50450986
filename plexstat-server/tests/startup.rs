use std::sync::Arc;

use chrono::Utc;
use plexstat_core::{InMemoryCatalog, SchedulerConfig};
use plexstat_model::{ContainerNode, LibrarySection};
use plexstat_server::infra::startup::bootstrap;

fn catalog_with_empty_library() -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.put_library(
        LibrarySection {
            key: "1".into(),
            title: "Movies".into(),
            kind: "movie".into(),
            updated_at: Some(Utc::now()),
        },
        ContainerNode::default(),
    );
    catalog
}

#[tokio::test]
async fn unreachable_server_fails_startup() {
    let catalog = catalog_with_empty_library();
    catalog.set_unreachable(true);

    let err = bootstrap(catalog.clone(), SchedulerConfig::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("connectivity check"));
    assert!(catalog.fetches().is_empty());
}

#[tokio::test]
async fn failed_initial_refresh_fails_startup() {
    let catalog = catalog_with_empty_library();
    catalog.fail_on("1");

    let err = bootstrap(catalog, SchedulerConfig::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("initial refresh failed"));
}

#[tokio::test]
async fn successful_bootstrap_commits_first_snapshot() {
    let collector = bootstrap(catalog_with_empty_library(), SchedulerConfig::default())
        .await
        .unwrap();

    let status = collector.state.status.snapshot();
    assert!(status.is_ready());
    assert_eq!(status.last_report.map(|r| r.walked_sections), Some(1));
}
