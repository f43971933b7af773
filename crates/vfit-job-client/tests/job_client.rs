//! Integration tests against a mock job server.

use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{DynamicImage, RgbImage};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vfit_image::image_to_png_bytes;
use vfit_job_client::{JobCatalog, JobClient, JobClientConfig, JobError, JobInput};

fn test_image() -> DynamicImage {
    let mut img = RgbImage::new(6, 6);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = image::Rgb([(x * 40) as u8, (y * 40) as u8, 200]);
    }
    DynamicImage::ImageRgb8(img)
}

fn success_body(img: &DynamicImage) -> serde_json::Value {
    json!({ "result": BASE64.encode(image_to_png_bytes(img).unwrap()) })
}

fn client_for(server: &MockServer, job_type: &str, max_attempts: u32) -> JobClient {
    let config = JobClientConfig {
        max_attempts,
        ..JobClientConfig::new(server.uri())
    };
    JobClient::new(&JobCatalog::standard(), job_type, config).unwrap()
}

fn handsfix_input() -> JobInput {
    JobInput::new().with_image("model_img", test_image())
}

fn body_contains(body: &[u8], needle: &[u8]) -> bool {
    body.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn run_job_decodes_result_round_trip() {
    let server = MockServer::start().await;
    let expected = test_image();

    Mock::given(method("POST"))
        .and(path("/run_job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&expected)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "handsfix_job", 3);
    let result = client.run_job(&handsfix_input()).await.unwrap();

    // Pixel-identical under PNG re-encoding.
    assert_eq!(result.to_rgb8(), expected.to_rgb8());
}

#[tokio::test]
async fn run_job_retries_then_succeeds_with_fixed_delay() {
    let server = MockServer::start().await;

    // First two attempts fail, the third succeeds.
    Mock::given(method("POST"))
        .and(path("/run_job"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "busy"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/run_job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&test_image())))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "handsfix_job", 3);
    let started = Instant::now();
    let result = client.run_job(&handsfix_input()).await;

    assert!(result.is_ok());
    // Two inter-attempt delays of 2s each.
    assert!(started.elapsed() >= Duration::from_secs(4));
}

#[tokio::test]
async fn run_job_makes_exactly_budget_attempts_then_raises_last_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/run_job"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "inference crashed",
            "stack_trace": "Traceback (most recent call last): ...",
        })))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, "handsfix_job", 3);
    let err = client.run_job(&handsfix_input()).await.unwrap_err();

    match err {
        JobError::Server { status, envelope } => {
            assert_eq!(status, 500);
            assert_eq!(envelope.error.as_deref(), Some("inference crashed"));
            assert!(envelope.stack_trace.is_some());
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn run_job_treats_invalid_result_data_as_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/run_job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "@@not-base64@@"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, "handsfix_job", 2);
    let err = client.run_job(&handsfix_input()).await.unwrap_err();
    assert!(matches!(err, JobError::Decode(_)));
}

#[tokio::test]
async fn run_job_fails_fast_on_missing_field_without_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/run_job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&test_image())))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, "handsfix_job", 3);
    let err = client.run_job(&JobInput::new()).await.unwrap_err();

    match err {
        JobError::InvalidInput(msg) => assert!(msg.contains("model_img")),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[tokio::test]
async fn tryon_request_carries_all_attachment_slots() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/run_job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(&test_image())))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "tryon_job", 1);
    let input = JobInput::new()
        .with_image("model_img", test_image())
        .with_image("cloth_img", test_image())
        .with_null("mask_img")
        .with_text("category", "upper_body");
    client.run_job(&input).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = &requests[0].body;

    // The null mask still occupies its multipart slot.
    assert!(body_contains(body, b"name=\"model_img_buffer\""));
    assert!(body_contains(body, b"name=\"cloth_img_buffer\""));
    assert!(body_contains(body, b"name=\"mask_img_buffer\""));
    assert!(body_contains(body, b"filename=\"mask.png\""));
    assert!(body_contains(body, b"name=\"generation_data\""));
    assert!(body_contains(body, b"\"category\":\"upper_body\""));
}

#[tokio::test]
async fn health_probe_true_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, "mask_job", 3);
    assert!(client.is_healthy().await);
}

#[tokio::test]
async fn health_probe_false_on_non_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, "mask_job", 3);
    assert!(!client.is_healthy().await);
}

#[tokio::test]
async fn health_probe_false_on_connection_refused() {
    let config = JobClientConfig::new("http://127.0.0.1:1");
    let client = JobClient::new(&JobCatalog::standard(), "mask_job", config).unwrap();
    assert!(!client.is_healthy().await);
}

#[tokio::test]
async fn health_probe_false_on_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(6)))
        .mount(&server)
        .await;

    let client = client_for(&server, "mask_job", 3);
    assert!(!client.is_healthy().await);
}
