//! Dispatch benchmark suite.
//!
//! Replays synthetic traffic through an in-process host:
//! - Request counts: 100, 1000
//! - Every request gets the full set of update types
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use firefox_netmonitor::request_utils::{headers_from_multipart_text, upload_headers_size};
use firefox_netmonitor::{
    FetchKind, FirefoxConnector, HostEvent, MemoryHost, Monitor, NetworkInfo, Prefs, UpdateType,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const REQUEST_COUNTS: &[usize] = &[100, 1000];

const UPDATES: [UpdateType; 9] = [
    UpdateType::RequestHeaders,
    UpdateType::RequestCookies,
    UpdateType::RequestPostData,
    UpdateType::SecurityInfo,
    UpdateType::ResponseHeaders,
    UpdateType::ResponseCookies,
    UpdateType::ResponseStart,
    UpdateType::ResponseContent,
    UpdateType::EventTimings,
];

// ============================================================================
// Benchmark: Full Request Lifecycle
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    init_logging();
    let rt = Runtime::new().expect("runtime");

    let mut group = c.benchmark_group("dispatch");
    group.sample_size(20);

    for &count in REQUEST_COUNTS {
        group.bench_with_input(
            BenchmarkId::new("requests", count),
            &count,
            |b, &request_count| {
                b.to_async(&rt)
                    .iter(|| async move { replay(request_count).await });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Multipart Header Extraction
// ============================================================================

fn bench_multipart(c: &mut Criterion) {
    let body = format!(
        "Content-Disposition: form-data; name=\"file\"\r\nContent-Type: text/plain\r\n\r\n{}",
        "x".repeat(64 * 1024)
    );

    c.bench_function("multipart_headers", |b| {
        b.iter(|| {
            let headers = headers_from_multipart_text(black_box(&body));
            upload_headers_size(&headers)
        });
    });
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Logs sub-fetch failures only; set `RUST_LOG` for more.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("firefox_netmonitor=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn script(host: &MemoryHost, actor: &str) {
    let payloads = [
        (
            FetchKind::RequestHeaders,
            json!({ "headers": [{ "name": "Accept", "value": "*/*" }], "headersSize": 12 }),
        ),
        (
            FetchKind::ResponseHeaders,
            json!({ "headers": [{ "name": "Server", "value": "bench" }], "headersSize": 14 }),
        ),
        (
            FetchKind::RequestCookies,
            json!({ "cookies": [{ "name": "sid", "value": "1" }] }),
        ),
        (FetchKind::ResponseCookies, json!([])),
        (
            FetchKind::RequestPostData,
            json!({ "postData": { "text": "a=1&b=2" } }),
        ),
        (
            FetchKind::SecurityInfo,
            json!({ "securityInfo": { "state": "secure" } }),
        ),
        (
            FetchKind::ResponseContent,
            json!({ "content": { "mimeType": "image/png", "text": "iVBORw0KGgo=", "encoding": "base64" } }),
        ),
        (
            FetchKind::EventTimings,
            json!({ "timings": { "wait": 4 }, "totalTime": 4 }),
        ),
    ];

    for (kind, payload) in payloads {
        host.respond(actor, kind, payload);
    }
}

async fn replay(request_count: usize) -> usize {
    let host = Arc::new(MemoryHost::new());
    let infos: Vec<NetworkInfo> = (0..request_count)
        .map(|i| {
            let actor = format!("server1.conn0.netEvent{i}");
            script(&host, &actor);
            let mut info = NetworkInfo::new(
                actor,
                "GET",
                format!("http://example.com/{i}.png"),
                "2020-01-01T00:00:00Z",
            );
            info.response.status = Some("200".into());
            info.response.content.mime_type = Some("image/png".into());
            info
        })
        .collect();

    let monitor = Arc::new(Monitor::new());
    let flusher = monitor.spawn_flusher(Duration::from_millis(1));
    let connector = FirefoxConnector::connect(host.clone(), monitor.clone(), &Prefs::default())
        .await
        .expect("connect");

    for info in &infos {
        host.emit(HostEvent::NetworkEvent(info.clone()));
        for update_type in &UPDATES {
            host.emit(HostEvent::NetworkEventUpdate {
                update_type: update_type.clone(),
                network_info: info.clone(),
            });
        }
    }

    connector.wait_idle().await;
    connector.close().await;
    flusher.abort();

    monitor.store().len()
}

criterion_group!(benches, bench_dispatch, bench_multipart);
criterion_main!(benches);
