mod common;

use rss_relay::{GoogleTranslator, Translator};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn translator(server: &MockServer) -> GoogleTranslator {
    common::init_tracing();
    GoogleTranslator::new(reqwest::Client::new(), "ru").with_base_url(server.uri())
}

#[tokio::test]
async fn test_segments_are_joined() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("tl", "ru"))
        .and(query_param("sl", "auto"))
        .and(query_param("q", "Hola. Adiós."))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [["Привет. ", "Hola. ", null, null], ["Пока.", "Adiós.", null, null]],
            null,
            "es"
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let translated = translator(&server).translate("Hola. Adiós.").await.unwrap();
    assert_eq!(translated, "Привет. Пока.");
}

#[tokio::test]
async fn test_empty_input_skips_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

    assert_eq!(translator(&server).translate("  ").await.unwrap(), "");
}

#[tokio::test]
async fn test_http_error_is_a_translate_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

    let err = translator(&server).translate("Hola").await.unwrap_err();
    assert!(err.0.contains("503"));
}

#[tokio::test]
async fn test_unexpected_payload_is_a_translate_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "nope"})))
        .mount(&server)
        .await;

    assert!(translator(&server).translate("Hola").await.is_err());
}
