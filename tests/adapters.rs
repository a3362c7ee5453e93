//! Adapter Integration Tests
//!
//! HTTP adapters exercised against a local mock server.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use feedcast::adapters::{ArticleSource, HttpArticleSource};
use feedcast::feed;

#[tokio::test]
async fn test_article_fetch_cleans_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><script>nope()</script></head>\
             <body><h1>Big News</h1><p>Something   happened &amp; mattered.</p></body></html>",
            "text/html",
        ))
        .mount(&server)
        .await;

    let source = HttpArticleSource::new().unwrap();
    let text = source.fetch(&format!("{}/article", server.uri())).await;

    assert_eq!(text.as_deref(), Some("Big News Something happened & mattered."));
}

#[tokio::test]
async fn test_article_fetch_sends_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .and(header("user-agent", "Mozilla/5.0 (compatible; Feedcast/1.0)"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>ok</p>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpArticleSource::new().unwrap();
    let text = source.fetch(&format!("{}/article", server.uri())).await;
    assert_eq!(text.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_article_fetch_error_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = HttpArticleSource::new().unwrap();
    assert_eq!(source.fetch(&format!("{}/missing", server.uri())).await, None);
}

#[tokio::test]
async fn test_feed_fetch_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>T</title><link>https://example.com</link><description>D</description>
  <item><title>One</title><link>https://example.com/1</link></item>
  <item><title>Two</title><guid>id-2</guid></item>
</channel></rss>"#,
            "application/rss+xml",
        ))
        .mount(&server)
        .await;

    let client = feed::feed_client().unwrap();
    let entries = feed::fetch_entries(&client, &format!("{}/feed.xml", server.uri()))
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].item_id(), Some("https://example.com/1"));
    assert_eq!(entries[1].item_id(), Some("id-2"));
}

#[tokio::test]
async fn test_feed_fetch_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = feed::feed_client().unwrap();
    let result = feed::fetch_entries(&client, &format!("{}/feed.xml", server.uri())).await;
    assert!(result.is_err());
}
