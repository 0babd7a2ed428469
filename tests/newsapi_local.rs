// tests/newsapi_local.rs
// NewsAPI provider against a local stand-in for the `everything` endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{extract::Query, extract::State, routing::get, Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use corridor_risk::ingest::config::NewsApiConfig;
use corridor_risk::ingest::providers::newsapi::NewsApiProvider;
use corridor_risk::ingest::types::{ArticleSource, FetchQuery};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Serves `full_pages` pages of `pageSize` articles, then one page of `tail`.
#[derive(Clone)]
struct Stub {
    seen: Seen,
    full_pages: u32,
    tail: usize,
}

async fn everything(
    State(stub): State<Stub>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let size: usize = params.get("pageSize").and_then(|p| p.parse().ok()).unwrap_or(0);
    stub.seen.lock().unwrap().push(params);
    let n = if page <= stub.full_pages { size } else { stub.tail };
    let articles: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "source": {"id": null, "name": "Wire"},
                "title": format!("p{page} #{i}"),
                "url": format!("https://news.test/{page}/{i}"),
                "publishedAt": "2025-03-09T10:00:00Z"
            })
        })
        .collect();
    Json(json!({"status": "ok", "totalResults": n, "articles": articles}))
}

async fn serve(full_pages: u32, tail: usize) -> (NewsApiProvider, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/v2/everything", get(everything))
        .with_state(Stub {
            seen: seen.clone(),
            full_pages,
            tail,
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let cfg = NewsApiConfig::from_parts("test-key", Some(format!("http://{addr}/v2/everything")))
        .unwrap();
    (NewsApiProvider::new(cfg).unwrap(), seen)
}

fn query(page_size: u32, max_pages: u32) -> FetchQuery {
    FetchQuery {
        query: "\"Rotterdam\" AND \"New York\"".into(),
        from: NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
        to: NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
        page_size,
        max_pages,
    }
}

#[tokio::test]
async fn pages_until_short_page_with_everything_params() {
    let (provider, seen) = serve(1, 5).await;
    let articles = provider.fetch_articles(&query(20, 3)).await.unwrap();
    assert_eq!(articles.len(), 25);
    assert_eq!(articles[0].title.as_deref(), Some("p1 #0"));
    assert_eq!(articles[24].title.as_deref(), Some("p2 #4"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2, "short second page stops paging");
    let first = &seen[0];
    assert_eq!(first["q"], "\"Rotterdam\" AND \"New York\"");
    assert_eq!(first["language"], "en");
    assert_eq!(first["sortBy"], "publishedAt");
    assert_eq!(first["pageSize"], "20");
    assert_eq!(first["page"], "1");
    assert_eq!(first["from"], "2025-03-03T12:00:00Z");
    assert_eq!(first["to"], "2025-03-10T12:00:00Z");
    assert_eq!(first["apiKey"], "test-key");
    assert_eq!(seen[1]["page"], "2");
}

#[tokio::test]
async fn stops_at_max_pages_when_every_page_is_full() {
    let (provider, seen) = serve(u32::MAX, 0).await;
    let articles = provider.fetch_articles(&query(20, 2)).await.unwrap();
    assert_eq!(articles.len(), 40);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn oversized_page_request_is_capped() {
    let (provider, seen) = serve(0, 0).await;
    let articles = provider.fetch_articles(&query(250, 1)).await.unwrap();
    assert!(articles.is_empty());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["pageSize"], "100");
}
