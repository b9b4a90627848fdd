//! Concurrency and upstream fallthrough of the source adapters.

use adapter_sources::{
    http_chain, http_client, Fallback, FlowService, IndexSnapshotService, ProviderChain,
    SyntheticFlow, SyntheticIndices, TtlCache,
};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use feed_core::{FlowDay, FlowLeg, IndexQuote, Provenance, SymbolDirectory};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn quotes() -> Vec<IndexQuote> {
    vec![IndexQuote {
        name: "NIFTY 50".to_string(),
        value: 22_100.0,
        change: 100.0,
        change_percent: 0.45,
    }]
}

#[tokio::test]
async fn test_ten_concurrent_misses_fetch_once() {
    let cache: Arc<TtlCache<&'static str, u32>> =
        Arc::new(TtlCache::new(Duration::from_secs(300)));
    let fetches = Arc::new(AtomicUsize::new(0));

    let readers = (0..10).map(|_| {
        let cache = Arc::clone(&cache);
        let fetches = Arc::clone(&fetches);
        tokio::spawn(async move {
            cache
                .get_or_fetch("indices", || async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    (42, Provenance::Live)
                })
                .await
        })
    });

    let reads: Vec<_> = join_all(readers)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(reads.iter().all(|r| *r.value == 42));
    assert_eq!(reads.iter().filter(|r| !r.cached).count(), 1);
}

#[tokio::test]
async fn test_distinct_keys_fetch_independently() {
    let cache: TtlCache<u32, u32> = TtlCache::new(Duration::from_secs(300));
    let fetches = AtomicUsize::new(0);
    let (cache, fetches) = (&cache, &fetches);

    let reads = join_all((0..4).map(move |key| {
        cache.get_or_fetch(key, move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            (key * 10, Provenance::Live)
        })
    }))
    .await;

    assert_eq!(fetches.load(Ordering::SeqCst), 4);
    assert_eq!(*reads[3].value, 30);
}

#[tokio::test]
async fn test_primary_is_live() {
    let base = serve(Router::new().route("/indices", get(|| async { Json(quotes()) }))).await;
    let client = http_client(Duration::from_secs(2)).unwrap();
    let fallback: Arc<dyn Fallback<(), Vec<IndexQuote>>> =
        Arc::new(SyntheticIndices::new(&SymbolDirectory::default(), 0.005));
    let chain = http_chain(Some(format!("{base}/indices").as_str()), None, &client, fallback);
    let service = IndexSnapshotService::new(chain, Duration::from_secs(300));

    let read = service.snapshot().await;
    assert_eq!(read.provenance, Provenance::Live);
    assert_eq!(*read.value, quotes());
}

#[tokio::test]
async fn test_failed_primary_falls_to_mirror() {
    let base = serve(
        Router::new()
            .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route("/mirror", get(|| async { Json(quotes()) })),
    )
    .await;
    let client = http_client(Duration::from_secs(2)).unwrap();
    let fallback: Arc<dyn Fallback<(), Vec<IndexQuote>>> =
        Arc::new(SyntheticIndices::new(&SymbolDirectory::default(), 0.005));
    let chain = http_chain(
        Some(format!("{base}/down").as_str()),
        Some(format!("{base}/mirror").as_str()),
        &client,
        fallback,
    );
    let service = IndexSnapshotService::new(chain, Duration::from_secs(300));

    let read = service.snapshot().await;
    assert_eq!(read.provenance, Provenance::LiveCached);
}

#[tokio::test]
async fn test_garbage_upstream_falls_to_synthetic() {
    let base = serve(
        Router::new()
            .route("/flow", get(|| async { "not json" }))
            .route("/slow", get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            })),
    )
    .await;
    let client = http_client(Duration::from_millis(200)).unwrap();
    let chain: ProviderChain<NaiveDate, FlowDay> = http_chain(
        Some(format!("{base}/flow").as_str()),
        Some(format!("{base}/slow").as_str()),
        &client,
        Arc::new(SyntheticFlow::default()),
    );
    let service = FlowService::new(chain, Duration::from_secs(300));

    let date = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    let read = service.day(date).await;
    assert_eq!(read.provenance, Provenance::FallbackSample);
    assert_eq!(*read.value, SyntheticFlow::default().day(date));
}

#[tokio::test]
async fn test_flow_primary_receives_date_query() {
    let base = serve(Router::new().route(
        "/flow",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            let date = NaiveDate::parse_from_str(&q["date"], "%Y-%m-%d").unwrap();
            Json(FlowDay {
                date,
                fii: FlowLeg::new(100.0, 40.0),
                dii: FlowLeg::new(50.0, 70.0),
            })
        }),
    ))
    .await;
    let client = http_client(Duration::from_secs(2)).unwrap();
    let chain: ProviderChain<NaiveDate, FlowDay> = http_chain(
        Some(format!("{base}/flow").as_str()),
        None,
        &client,
        Arc::new(SyntheticFlow::default()),
    );
    let service = FlowService::new(chain, Duration::from_secs(300));

    let report = service
        .flow("1W", NaiveDate::from_ymd_opt(2024, 6, 14).unwrap())
        .await
        .unwrap();
    assert_eq!(report.provenance, Provenance::Live);
    assert_eq!(report.data[0].date, NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
    assert_eq!(report.data[0].fii.net, 60.0);
}
