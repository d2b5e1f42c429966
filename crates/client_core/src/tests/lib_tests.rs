use super::*;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use shared::{domain::InputState, protocol::PredictionValue};
use std::sync::Arc;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

type CapturedRequest = (Option<String>, Value);

#[derive(Clone)]
struct PredictServerState {
    tx: Arc<Mutex<Option<oneshot::Sender<CapturedRequest>>>>,
    status: StatusCode,
    body: String,
}

async fn handle_predict(
    State(state): State<PredictServerState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let parsed = serde_json::from_str(&body).unwrap_or(Value::Null);
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send((content_type, parsed));
    }
    (state.status, state.body.clone())
}

async fn spawn_predict_server(
    status: StatusCode,
    body: impl Into<String>,
) -> Result<(String, oneshot::Receiver<CapturedRequest>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = PredictServerState {
        tx: Arc::new(Mutex::new(Some(tx))),
        status,
        body: body.into(),
    };
    let app = Router::new()
        .route("/predict", post(handle_predict))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/predict"), rx))
}

fn request(domain: &str, dataset_size: &str) -> PredictionRequest {
    PredictionRequest::from(&InputState::new(domain, dataset_size))
}

#[tokio::test]
async fn posts_json_body_with_content_type_header() {
    let (url, rx) = spawn_predict_server(
        StatusCode::OK,
        r#"{"prediction": 42.5, "colour_prediction": "green"}"#,
    )
    .await
    .expect("server");
    let client = HttpPredictionClient::new(&url).expect("client");

    let response = client.send(&request("nlp", "1200")).await.expect("send");
    assert_eq!(response.prediction, PredictionValue::Scalar(42.5));
    assert_eq!(response.colour_prediction.as_deref(), Some("green"));

    let (content_type, body) = rx.await.expect("captured request");
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, json!({ "domain": "nlp", "datasetSize": "1200" }));
}

#[tokio::test]
async fn forwards_empty_and_malformed_values_untouched() {
    let (url, rx) = spawn_predict_server(StatusCode::OK, r#"{"prediction": [0.0]}"#)
        .await
        .expect("server");
    let client = HttpPredictionClient::new(&url).expect("client");

    client.send(&request("", "12abc")).await.expect("send");

    let (_, body) = rx.await.expect("captured request");
    assert_eq!(body, json!({ "domain": "", "datasetSize": "12abc" }));
}

#[tokio::test]
async fn non_success_status_is_a_server_error() {
    let (url, _rx) = spawn_predict_server(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"prediction": 1, "colour_prediction": "red"}"#,
    )
    .await
    .expect("server");
    let client = HttpPredictionClient::new(&url).expect("client");

    let err = client.send(&request("nlp", "1")).await.expect_err("500");
    assert_eq!(err, PredictionError::Server { status: 500 });
}

#[tokio::test]
async fn invalid_json_is_a_parse_error() {
    let (url, _rx) = spawn_predict_server(StatusCode::OK, "<html>oops</html>")
        .await
        .expect("server");
    let client = HttpPredictionClient::new(&url).expect("client");

    let err = client.send(&request("nlp", "1")).await.expect_err("parse");
    assert!(matches!(err, PredictionError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn missing_prediction_field_is_a_parse_error() {
    let (url, _rx) = spawn_predict_server(StatusCode::OK, r#"{"colour_prediction": "red"}"#)
        .await
        .expect("server");
    let client = HttpPredictionClient::new(&url).expect("client");

    let err = client.send(&request("nlp", "1")).await.expect_err("parse");
    assert!(matches!(err, PredictionError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HttpPredictionClient::new(&format!("http://{addr}/predict")).expect("client");
    let err = client.send(&request("nlp", "1")).await.expect_err("network");
    assert!(matches!(err, PredictionError::Network(_)), "got {err:?}");
}

#[test]
fn rejects_unusable_endpoints() {
    assert!(HttpPredictionClient::new("not a url").is_err());
    assert!(HttpPredictionClient::new("ftp://example.com/predict").is_err());
}

#[test]
fn default_endpoint_is_the_hosted_service() {
    let client = HttpPredictionClient::with_default_endpoint().expect("client");
    assert_eq!(client.endpoint().as_str(), DEFAULT_PREDICT_URL);
}
