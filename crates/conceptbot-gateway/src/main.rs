//! Conceptbot Gateway — POST /chat answers programming-concept questions.
//! Knowledge base, similarity index and models are loaded once at startup and shared
//! read-only by every request.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{Html, Response},
    routing::{get, post},
    Json, Router,
};
use conceptbot_core::{AnswerSelector, ChatContext, ChatError, ChatbotConfig, SelectionPolicy, SelectionResult};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    selector: Arc<AnswerSelector>,
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[conceptbot-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ChatbotConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("[CONCEPTBOT] Configuration failed: {}", e);
            std::process::exit(1);
        }
    };

    let context = match ChatContext::load(&config) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("[CONCEPTBOT] Startup load failed, not serving: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        selector: Arc::new(AnswerSelector::new(context, SelectionPolicy::from(&config))),
    };

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("[CONCEPTBOT] Cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "[CONCEPTBOT] Gateway v{} listening on http://{} (threshold {:.2})",
        conceptbot_core::version(),
        addr,
        config.similarity_threshold
    );

    if let Err(e) = axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("[CONCEPTBOT] Server error: {}", e);
        std::process::exit(1);
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_landing_page))
        .route("/health", get(health))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_request))
}

async fn log_request(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = connect_info
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::info!(
        "[CONCEPTBOT] {} {} from {}",
        request.method(),
        request.uri().path(),
        peer
    );
    next.run(request).await
}

async fn health() -> &'static str {
    "OK"
}

/// Landing page with a minimal chat box.
async fn serve_landing_page() -> Html<&'static str> {
    const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
    Html(INDEX)
}

/// POST /chat: `{"message": "..."}` → `{"response": "...", "confidence": 0.912}`.
/// Missing, blank or unparsable messages are rejected before any selection work.
async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<SelectionResult>, ApiError> {
    let Json(body) = payload.map_err(|e| bad_request(e.body_text()))?;
    let message = body
        .message
        .ok_or_else(|| bad_request("missing 'message' field".to_string()))?;

    let result = state.selector.select(&message).map_err(|e| match e {
        ChatError::InvalidInput(msg) => bad_request(msg),
    })?;

    tracing::info!(
        "[CONCEPTBOT] Answered via {:?} (confidence {:.3})",
        result.source,
        result.confidence
    );
    Ok(Json(result))
}

fn bad_request(msg: String) -> ApiError {
    tracing::warn!("[CONCEPTBOT] Rejected chat request: {}", msg);
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": msg })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptbot_core::{
        FallbackTable, IntentClassifier, IntentPrediction, KnowledgeBase, TextVectorizer,
    };
    use tower::ServiceExt;

    const VOCAB: &[&str] = &["binary", "search", "sorted", "hello"];

    struct LookupVectorizer;

    impl TextVectorizer for LookupVectorizer {
        fn dimension(&self) -> usize {
            VOCAB.len()
        }

        fn transform(&self, text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            VOCAB
                .iter()
                .map(|w| lower.split_whitespace().filter(|t| t == w).count() as f32)
                .collect()
        }
    }

    /// "hello" → greeting, anything else → concept.
    struct KeywordClassifier {
        labels: Vec<String>,
    }

    impl IntentClassifier for KeywordClassifier {
        fn predict(&self, features: &[f32]) -> IntentPrediction {
            if features[3] > 0.0 {
                IntentPrediction { label: "greeting".into(), confidence: 0.9123 }
            } else {
                IntentPrediction { label: "concept".into(), confidence: 0.6667 }
            }
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }
    }

    fn test_app() -> Router {
        let kb = match serde_json::json!({
            "binary_search": {"definition": "Find item in sorted array in O(log n)."}
        }) {
            serde_json::Value::Object(m) => KnowledgeBase::from_map(m),
            _ => unreachable!(),
        };
        let ctx = ChatContext::new(
            kb,
            Arc::new(LookupVectorizer),
            Arc::new(KeywordClassifier {
                labels: vec!["concept".into(), "greeting".into()],
            }),
            FallbackTable::from_pairs([("greeting", "Hi! Ask me about a concept.")]),
        );
        app(AppState {
            selector: Arc::new(AnswerSelector::new(ctx, SelectionPolicy::default())),
        })
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_formatted_concept_and_confidence() {
        let res = test_app()
            .oneshot(chat_request(r#"{"message": "binary search"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        let response = json["response"].as_str().unwrap();
        assert!(response.contains("Concept: Binary Search"));
        assert!(response.contains("Find item in sorted array in O(log n)."));
        assert_eq!(json["confidence"], 0.667);
        assert!(json.get("source").is_none());
    }

    #[tokio::test]
    async fn chat_greeting_uses_canned_response() {
        let res = test_app()
            .oneshot(chat_request(r#"{"message": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["response"], "Hi! Ask me about a concept.");
        assert_eq!(json["confidence"], 0.912);
    }

    #[tokio::test]
    async fn missing_message_is_bad_request() {
        let res = test_app().oneshot(chat_request("{}")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = json_body(res).await;
        assert!(json["error"].as_str().unwrap().contains("message"));
    }

    #[tokio::test]
    async fn blank_message_is_bad_request() {
        let res = test_app()
            .oneshot(chat_request(r#"{"message": "   "}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let res = test_app().oneshot(chat_request("{\"message\":")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_and_landing_page() {
        let app = test_app();
        let res = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");

        let res = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/chat"));
    }
}
