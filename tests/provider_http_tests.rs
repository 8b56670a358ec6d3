//! Mock HTTP tests for the Grok and OpenAI clients and the acquisition chain.

use base64::Engine;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storyreel::providers::{
    GrokClient, ImageAcquirer, ImageRequest, ImageSize, OpenAiClient, Provider, ProviderError,
};
use storyreel::render::render_placeholder;

fn tiny_png() -> Vec<u8> {
    render_placeholder("tiny", ImageSize::new(4, 4)).unwrap()
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

// === Grok ===

#[tokio::test]
async fn test_grok_sends_bearer_and_aspect_ratio() {
    let mock_server = MockServer::start().await;
    let png = tiny_png();

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(header("Authorization", "Bearer xai-test"))
        .and(body_json(json!({
            "model": "grok-2-vision",
            "prompt": "a red fox",
            "aspect_ratio": "16:9"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"b64_json": b64(&png)}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let request = ImageRequest::new("a red fox", "1920x1080", None);
    let bytes = client.generate(&request).await.unwrap();

    assert_eq!(bytes, png);
}

#[tokio::test]
async fn test_grok_explicit_aspect_wins_over_size() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_json(json!({
            "model": "grok-2-vision",
            "prompt": "tower",
            "aspect_ratio": "9:16"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"b64_json": b64(&tiny_png())}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let request = ImageRequest::new("tower", "1024x1024", Some("9:16"));
    assert!(client.generate(&request).await.is_ok());
}

#[tokio::test]
async fn test_grok_downloads_url_when_no_b64() {
    let mock_server = MockServer::start().await;
    let png = tiny_png();
    let image_url = format!("{}/files/img.png", mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"url": image_url}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/img.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let bytes = client
        .generate(&ImageRequest::new("fox", "1024x1024", None))
        .await
        .unwrap();

    assert_eq!(bytes, png);
}

#[tokio::test]
async fn test_grok_failed_download_is_error() {
    let mock_server = MockServer::start().await;
    let image_url = format!("{}/files/missing.png", mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"url": image_url}]})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let result = client
        .generate(&ImageRequest::new("fox", "1024x1024", None))
        .await;

    assert!(matches!(
        result,
        Err(ProviderError::DownloadFailed { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_grok_non_2xx_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-bad".to_string(), mock_server.uri()).unwrap();
    let result = client
        .generate(&ImageRequest::new("fox", "1024x1024", None))
        .await;

    match result {
        Err(ProviderError::ApiError { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid api key"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_grok_empty_data_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let result = client
        .generate(&ImageRequest::new("fox", "1024x1024", None))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_grok_entry_without_image_is_no_image_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"revised_prompt": "fox"}]})),
        )
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let result = client
        .generate(&ImageRequest::new("fox", "1024x1024", None))
        .await;

    assert!(matches!(result, Err(ProviderError::NoImageData)));
}

// === OpenAI ===

#[tokio::test]
async fn test_openai_sends_size() {
    let mock_server = MockServer::start().await;
    let png = tiny_png();

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "gpt-image-1",
            "prompt": "a lighthouse",
            "size": "1024x1024"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"b64_json": b64(&png)}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenAiClient::with_base_url("sk-test".to_string(), mock_server.uri()).unwrap();
    let bytes = client
        .generate(&ImageRequest::new("a lighthouse", "1024x1024", Some("16:9")))
        .await
        .unwrap();

    assert_eq!(bytes, png);
}

#[tokio::test]
async fn test_openai_retries_with_aspect_ratio_when_size_rejected() {
    let mock_server = MockServer::start().await;
    let png = tiny_png();

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_json(json!({
            "model": "gpt-image-1",
            "prompt": "a lighthouse",
            "size": "1920x1080"
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid value for 'size'", "param": "size"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_json(json!({
            "model": "gpt-image-1",
            "prompt": "a lighthouse",
            "aspect_ratio": "16:9"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"b64_json": b64(&png)}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenAiClient::with_base_url("sk-test".to_string(), mock_server.uri()).unwrap();
    let bytes = client
        .generate(&ImageRequest::new("a lighthouse", "1920x1080", Some("16:9")))
        .await
        .unwrap();

    assert_eq!(bytes, png);
}

#[tokio::test]
async fn test_openai_other_400_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Your prompt was rejected by the safety system"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenAiClient::with_base_url("sk-test".to_string(), mock_server.uri()).unwrap();
    let result = client
        .generate(&ImageRequest::new("p", "1024x1024", Some("1:1")))
        .await;

    assert!(matches!(
        result,
        Err(ProviderError::ApiError { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_openai_server_error_keeps_truncated_body() {
    let mock_server = MockServer::start().await;
    let long_body = "e".repeat(500);

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(502).set_body_string(long_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenAiClient::with_base_url("sk-test".to_string(), mock_server.uri()).unwrap();
    let result = client
        .generate(&ImageRequest::new("p", "1024x1024", None))
        .await;

    match result {
        Err(ProviderError::ApiError { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body.len(), 200);
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

// === Acquisition chain ===

#[tokio::test]
async fn test_acquirer_returns_provider_bytes() {
    let mock_server = MockServer::start().await;
    let png = tiny_png();

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"b64_json": b64(&png)}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let acquirer = ImageAcquirer::with_providers(vec![Provider::Grok(client)]);
    let bytes = acquirer
        .acquire(&ImageRequest::new("fox", "64x64", None))
        .await
        .unwrap();

    assert_eq!(bytes, png);
}

#[tokio::test]
async fn test_acquirer_falls_back_to_placeholder_on_provider_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let acquirer = ImageAcquirer::with_providers(vec![Provider::Grok(client)]);
    let bytes = acquirer
        .acquire(&ImageRequest::new("fox in snow", "320x200", None))
        .await
        .unwrap();

    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (320, 200));
    assert_eq!(
        bytes,
        render_placeholder("fox in snow", ImageSize::new(320, 200)).unwrap()
    );
}

#[tokio::test]
async fn test_acquirer_tries_chain_in_order() {
    let failing = MockServer::start().await;
    let working = MockServer::start().await;
    let png = tiny_png();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&failing)
        .await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"b64_json": b64(&png)}]})),
        )
        .expect(1)
        .mount(&working)
        .await;

    let acquirer = ImageAcquirer::with_providers(vec![
        Provider::Grok(GrokClient::with_base_url("xai".to_string(), failing.uri()).unwrap()),
        Provider::OpenAi(OpenAiClient::with_base_url("sk".to_string(), working.uri()).unwrap()),
    ]);

    assert_eq!(acquirer.provider_names(), vec!["grok", "openai"]);
    let bytes = acquirer
        .acquire(&ImageRequest::new("fox", "1024x1024", None))
        .await
        .unwrap();
    assert_eq!(bytes, png);
}

#[tokio::test]
async fn test_fallback_with_unparseable_size_is_default_canvas() {
    let acquirer = ImageAcquirer::local_only();
    let bytes = acquirer
        .acquire(&ImageRequest::new("fox", "800x0", None))
        .await
        .unwrap();

    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (1024, 1024));
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

#[tokio::test]
async fn test_acquirer_converts_jpeg_payload_to_png() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"b64_json": b64(&jpeg(64, 48))}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let acquirer = ImageAcquirer::with_providers(vec![Provider::Grok(client)]);
    let bytes = acquirer
        .acquire(&ImageRequest::new("fox", "1024x1024", None))
        .await
        .unwrap();

    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Png
    );
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (64, 48));
}

#[tokio::test]
async fn test_acquirer_falls_back_when_payload_is_not_an_image() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"b64_json": b64(b"definitely not pixels")}]})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GrokClient::with_base_url("xai-test".to_string(), mock_server.uri()).unwrap();
    let acquirer = ImageAcquirer::with_providers(vec![Provider::Grok(client)]);
    let bytes = acquirer
        .acquire(&ImageRequest::new("owl", "80x60", None))
        .await
        .unwrap();

    assert_eq!(
        bytes,
        render_placeholder("owl", ImageSize::new(80, 60)).unwrap()
    );
}
