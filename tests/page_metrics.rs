mod support;

use std::collections::HashMap;
use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use folio::application::blogs::BlogService;
use folio::application::pagination::PageWindow;
use folio::infra::telemetry;

use support::{FailingBlogs, MemoryBlogs};

#[tokio::test]
async fn page_fetches_emit_expected_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let healthy = BlogService::new(Arc::new(MemoryBlogs::with_daily_posts(12)));
    healthy.list_page(PageWindow::first(10)).await.unwrap();
    healthy
        .list_page(PageWindow::from_query(Some("10"), Some("10")))
        .await
        .unwrap();

    let failing = BlogService::new(Arc::new(FailingBlogs::Timeout));
    assert!(failing.list_page(PageWindow::first(10)).await.is_err());

    let values: HashMap<String, DebugValue> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, value)| (composite_key.key().name().to_string(), value))
        .collect();

    assert!(matches!(
        values.get("folio_blog_pages_served_total"),
        Some(DebugValue::Counter(2))
    ));
    assert!(matches!(
        values.get("folio_blog_page_errors_total"),
        Some(DebugValue::Counter(1))
    ));
    match values.get("folio_blog_page_fetch_ms") {
        Some(DebugValue::Histogram(samples)) => assert_eq!(samples.len(), 3),
        other => panic!("missing fetch latency histogram: {other:?}"),
    }
}
