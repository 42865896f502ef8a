//! wait_for_completion / submit_and_wait against a mock server.

mod common;

use common::MockServerFixture;
use replicate_lib_rust::{Error, PredictionRequest, PredictionStatus, SubmitOptions};
use serde_json::json;

#[tokio::test]
async fn already_succeeded_returns_after_one_fetch() {
    let mut fixture = MockServerFixture::new().await;
    let mut body = fixture.prediction_json("p-ok", "succeeded");
    body["output"] = json!(["https://replicate.delivery/out-0.png"]);
    body["metrics"] = json!({"predict_time": 1.25});
    let mock = fixture.mock_status("p-ok", &body, 1).await;

    let client = fixture.client(5).unwrap();
    let prediction = client.wait_for_completion("p-ok").await.unwrap();

    assert_eq!(prediction.status, PredictionStatus::Succeeded);
    assert_eq!(
        prediction.output,
        Some(json!(["https://replicate.delivery/out-0.png"]))
    );
    assert_eq!(prediction.metrics.and_then(|m| m.predict_time), Some(1.25));
    mock.assert_async().await;
}

#[tokio::test]
async fn failed_prediction_carries_the_service_message() {
    let mut fixture = MockServerFixture::new().await;
    let mut body = fixture.prediction_json("p-fail", "failed");
    body["error"] = json!("CUDA out of memory");
    let mock = fixture.mock_status("p-fail", &body, 1).await;

    let client = fixture.client(5).unwrap();
    let err = client.wait_for_completion("p-fail").await.unwrap_err();

    assert!(err.is_remote_failure());
    assert_eq!(err.to_string(), "Prediction failed: CUDA out of memory");
    assert_eq!(err.prediction_id(), Some("p-fail"));
    mock.assert_async().await;
}

#[tokio::test]
async fn failed_prediction_without_message_reports_unknown_error() {
    let mut fixture = MockServerFixture::new().await;
    let body = fixture.prediction_json("p-fail", "failed");
    let _mock = fixture.mock_status("p-fail", &body, 1).await;

    let client = fixture.client(5).unwrap();
    let err = client.wait_for_completion("p-fail").await.unwrap_err();
    assert_eq!(err.to_string(), "Prediction failed: Unknown error");
}

#[tokio::test]
async fn canceled_and_aborted_are_cancellations() {
    for status in ["canceled", "aborted"] {
        let mut fixture = MockServerFixture::new().await;
        let body = fixture.prediction_json("p-stop", status);
        let mock = fixture.mock_status("p-stop", &body, 1).await;

        let client = fixture.client(5).unwrap();
        let err = client.wait_for_completion("p-stop").await.unwrap_err();

        assert!(matches!(err, Error::PredictionCanceled { .. }));
        assert_eq!(
            err.to_string(),
            format!("Prediction was canceled (status: {})", status)
        );
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn exhaustion_stops_after_exactly_max_attempts() {
    let mut fixture = MockServerFixture::new().await;
    let body = fixture.prediction_json("p-slow", "processing");
    let mock = fixture.mock_status("p-slow", &body, 3).await;

    let client = fixture.client(3).unwrap();
    let err = client.wait_for_completion("p-slow").await.unwrap_err();

    assert!(err.is_polling_exhausted());
    assert!(!err.is_remote_failure());
    assert!(matches!(err, Error::PollingExhausted { attempts: 3, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn queued_predictions_keep_polling_until_the_cap() {
    let mut fixture = MockServerFixture::new().await;
    let body = fixture.prediction_json("p-queued", "starting");
    let mock = fixture.mock_status("p-queued", &body, 2).await;

    let client = fixture.client(2).unwrap();
    let err = client.wait_for_completion("p-queued").await.unwrap_err();

    assert!(err.is_polling_exhausted());
    mock.assert_async().await;
}

#[tokio::test]
async fn unknown_status_is_a_protocol_error() {
    let mut fixture = MockServerFixture::new().await;
    let body = fixture.prediction_json("p-odd", "hibernating");
    let _mock = fixture.mock_status("p-odd", &body, 1).await;

    let client = fixture.client(5).unwrap();
    let err = client.wait_for_completion("p-odd").await.unwrap_err();
    assert!(err.is_protocol());
}

#[tokio::test]
async fn submit_and_wait_polls_the_returned_id() {
    let mut fixture = MockServerFixture::new().await;
    let created = fixture.prediction_json("p-flow", "starting");
    let mut finished = fixture.prediction_json("p-flow", "succeeded");
    finished["output"] = json!("a red bicycle");

    let submit = fixture
        .mock_json("POST", "/models/acme/echo/predictions", 201, &created)
        .await;
    let poll = fixture.mock_status("p-flow", &finished, 1).await;

    let client = fixture.client(5).unwrap();
    let prediction = client
        .submit_and_wait(
            Some("acme/echo"),
            &PredictionRequest::new().with_input("prompt", "a red bicycle"),
            &SubmitOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(prediction.output_text().as_deref(), Some("a red bicycle"));
    submit.assert_async().await;
    poll.assert_async().await;
}

#[tokio::test]
async fn submit_and_wait_without_an_id_does_not_poll() {
    let mut fixture = MockServerFixture::new().await;
    let created = json!({"status": "starting"});
    let _submit = fixture
        .mock_json("POST", "/models/acme/echo/predictions", 201, &created)
        .await;
    let poll = fixture
        .server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = fixture.client(5).unwrap();
    let err = client
        .submit_and_wait(Some("acme/echo"), &PredictionRequest::new(), &SubmitOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_protocol());
    assert!(err
        .to_string()
        .contains("Prediction request did not return a valid response"));
    poll.assert_async().await;
}
