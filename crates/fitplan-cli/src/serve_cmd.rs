//! `fitplan serve`: the three generation endpoints over HTTP.
//!
//! - `POST /api/generate-plan`  -- profile fields in, `{ week_plan }` out
//! - `POST /api/generate-audio` -- `{ text }` in, `{ audioBase64 }` out
//! - `POST /api/generate-image` -- `{ prompt, type }` in, `{ success, imageUrl }` out
//!
//! Errors are JSON objects with an `error` message and, where useful, a
//! `fields`, `raw` or `detail` member.

use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use fitplan_core::media::{ImageCategory, MIN_NARRATION_CHARS, MediaError};
use fitplan_core::{PlanError, ProfileField, ProfileForm, SessionServices};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
    extra: Map<String, Value>,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
            extra: Map::new(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra member to the error body.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let mut body = self.extra;
        body.insert("error".to_string(), Value::String(self.message));
        (self.status, Json(Value::Object(body))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(services: SessionServices) -> Router {
    Router::new()
        .route("/api/generate-plan", post(generate_plan))
        .route("/api/generate-audio", post(generate_audio))
        .route("/api/generate-image", post(generate_image))
        .layer(CorsLayer::permissive())
        .with_state(services)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(services: SessionServices, bind: &str, port: u16) -> Result<()> {
    let app = build_router(services);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("fitplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nShutting down...");
        }
        on_signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    info!("fitplan serve shut down");
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn str_member<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
}

async fn generate_plan(
    State(services): State<SessionServices>,
    Json(body): Json<Value>,
) -> Result<axum::response::Response, AppError> {
    let Some(object) = body.as_object() else {
        return Err(AppError::bad_request("Request body must be a JSON object"));
    };
    let mut form = ProfileForm::from_json_object(object);

    match services.plans.generate_from_form(&mut form).await {
        Ok((_, week_plan)) => Ok(Json(json!({ "week_plan": week_plan })).into_response()),
        Err(PlanError::Validation(errors)) => {
            let names: Vec<&str> = errors.fields().map(ProfileField::as_str).collect();
            Err(
                AppError::bad_request(format!("Missing or invalid fields: {}", names.join(", ")))
                    .with("fields", json!(errors.to_wire_map())),
            )
        }
        Err(PlanError::MalformedResponse { raw, .. }) => {
            Err(AppError::internal("Invalid AI JSON").with("raw", raw))
        }
        Err(e) => Err(AppError::internal(e.to_string())),
    }
}

async fn generate_audio(
    State(services): State<SessionServices>,
    Json(body): Json<Value>,
) -> Result<axum::response::Response, AppError> {
    let text = str_member(&body, "text");
    if text.chars().count() < MIN_NARRATION_CHARS {
        return Err(AppError::bad_request("Invalid text."));
    }

    match services.narration.synthesize_speech(text).await {
        Ok(audio) => Ok(Json(json!({ "audioBase64": audio.to_base64() })).into_response()),
        Err(MediaError::UpstreamConfig { .. }) => {
            Err(AppError::internal("Deepgram API key missing on server."))
        }
        Err(e) => {
            error!(
                error = %e,
                detail = e.detail().unwrap_or_default(),
                "narration request failed"
            );
            Err(AppError::internal("Deepgram TTS failed."))
        }
    }
}

async fn generate_image(
    State(services): State<SessionServices>,
    Json(body): Json<Value>,
) -> Result<axum::response::Response, AppError> {
    let prompt = str_member(&body, "prompt");
    if prompt.is_empty() {
        return Err(AppError::bad_request("Prompt missing"));
    }
    let category = match str_member(&body, "type") {
        "exercise" => ImageCategory::Exercise,
        _ => ImageCategory::Meal,
    };

    match services.illustration.generate_image(prompt, category).await {
        Ok(image) => {
            Ok(Json(json!({ "success": true, "imageUrl": image.data_url() })).into_response())
        }
        Err(MediaError::UpstreamConfig { .. }) => {
            Err(AppError::internal("Missing Stability API key"))
        }
        Err(e) => {
            let detail = e.detail().map(str::to_string).unwrap_or_else(|| e.to_string());
            Err(AppError::internal("Image API failed").with("detail", detail))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use fitplan_core::media::{IllustrationService, NarrationService};
    use fitplan_core::upstream::{
        DeepgramClient, GeminiClient, ImageGenerator, PlanModel, SpeechSynthesizer,
        StabilityClient, UpstreamError,
    };
    use fitplan_core::{PlanService, SessionServices};
    use fitplan_test_utils::{sample_form_values, sample_week_plan_json};

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    struct FixedModel(String);

    #[async_trait]
    impl PlanModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete_json(&self, _prompt: &str) -> Result<String, UpstreamError> {
            Ok(self.0.clone())
        }
    }

    struct FakeSpeech {
        fail: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSpeech {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, UpstreamError> {
            if self.fail {
                return Err(UpstreamError::Status {
                    service: "deepgram",
                    status: 402,
                    body: "out of credits".into(),
                });
            }
            Ok(text.as_bytes().to_vec())
        }
    }

    #[derive(Default)]
    struct FakeImages {
        prompts: Mutex<Vec<String>>,
        reject: bool,
    }

    #[async_trait]
    impl ImageGenerator for FakeImages {
        async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.reject {
                return Err(UpstreamError::Status {
                    service: "stability",
                    status: 400,
                    body: "content filtered".into(),
                });
            }
            Ok("data:image/png;base64,iVBORw0KGgo=".to_string())
        }
    }

    fn services_with(
        model: Arc<dyn PlanModel>,
        speech: Arc<dyn SpeechSynthesizer>,
        images: Arc<dyn ImageGenerator>,
    ) -> SessionServices {
        SessionServices {
            plans: PlanService::new(model),
            narration: NarrationService::new(speech),
            illustration: IllustrationService::new(images),
        }
    }

    fn working_services(images: Arc<FakeImages>) -> SessionServices {
        services_with(
            Arc::new(FixedModel(sample_week_plan_json().to_string())),
            Arc::new(FakeSpeech { fail: false }),
            images,
        )
    }

    /// Real clients with no credentials: every call fails before the network.
    fn unconfigured_services() -> SessionServices {
        services_with(
            Arc::new(GeminiClient::new(None)),
            Arc::new(DeepgramClient::new(None)),
            Arc::new(StabilityClient::new(None)),
        )
    }

    fn profile_body() -> Value {
        let map: serde_json::Map<String, Value> = sample_form_values()
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect();
        Value::Object(map)
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn post_json(
        services: SessionServices,
        uri: &str,
        body: &Value,
    ) -> (StatusCode, Value) {
        let app = super::build_router(services);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    // -----------------------------------------------------------------------
    // generate-plan
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn plan_returns_seven_days() {
        let services = working_services(Arc::default());
        let (status, json) = post_json(services, "/api/generate-plan", &profile_body()).await;
        assert_eq!(status, StatusCode::OK);
        let week = json["week_plan"].as_object().expect("week_plan object");
        assert_eq!(week.len(), 7);
        assert!(week["day1"]["diet_plan"]["breakfast"].is_object());
    }

    #[tokio::test]
    async fn plan_accepts_numeric_fields() {
        let mut body = profile_body();
        body["age"] = json!(29);
        body["height"] = json!(168);
        let services = working_services(Arc::default());
        let (status, _) = post_json(services, "/api/generate-plan", &body).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn plan_reports_invalid_fields() {
        let mut body = profile_body();
        body.as_object_mut().unwrap().remove("dietaryPreference");
        body["age"] = json!("12");

        let services = working_services(Arc::default());
        let (status, json) = post_json(services, "/api/generate-plan", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("age"), "unexpected error: {error}");
        assert!(error.contains("dietaryPreference"), "unexpected error: {error}");
        assert_eq!(json["fields"]["age"], "Age must be between 13 and 120");
        assert!(json["fields"].get("name").is_none());
    }

    #[tokio::test]
    async fn plan_rejects_non_object_body() {
        let services = working_services(Arc::default());
        let (status, json) = post_json(services, "/api/generate-plan", &json!([1, 2])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Request body must be a JSON object");
    }

    #[tokio::test]
    async fn malformed_model_output_is_returned_raw() {
        let services = services_with(
            Arc::new(FixedModel(r#"{"day1": {}}"#.to_string())),
            Arc::new(FakeSpeech { fail: false }),
            Arc::new(FakeImages::default()),
        );
        let (status, json) = post_json(services, "/api/generate-plan", &profile_body()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Invalid AI JSON");
        assert_eq!(json["raw"], r#"{"day1": {}}"#);
    }

    #[tokio::test]
    async fn plan_without_key_is_config_error() {
        let (status, json) =
            post_json(unconfigured_services(), "/api/generate-plan", &profile_body()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
    }

    // -----------------------------------------------------------------------
    // generate-audio
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn audio_returns_base64() {
        let services = working_services(Arc::default());
        let (status, json) =
            post_json(services, "/api/generate-audio", &json!({ "text": "Hi there" })).await;
        assert_eq!(status, StatusCode::OK);
        // The fake echoes the text bytes.
        assert_eq!(json["audioBase64"], "SGkgdGhlcmU=");
    }

    #[tokio::test]
    async fn audio_rejects_short_or_missing_text() {
        let bodies = [
            json!({ "text": "hi" }),
            json!({ "text": "   ab  " }),
            json!({}),
            json!({ "text": 42 }),
        ];
        for body in bodies {
            let (status, json) =
                post_json(working_services(Arc::default()), "/api/generate-audio", &body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json["error"], "Invalid text.");
        }
    }

    #[tokio::test]
    async fn audio_without_key_is_config_error() {
        let (status, json) = post_json(
            unconfigured_services(),
            "/api/generate-audio",
            &json!({ "text": "Warm up" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Deepgram API key missing on server.");
    }

    #[tokio::test]
    async fn audio_upstream_failure_hides_body() {
        let services = services_with(
            Arc::new(FixedModel(String::new())),
            Arc::new(FakeSpeech { fail: true }),
            Arc::new(FakeImages::default()),
        );
        let (status, json) =
            post_json(services, "/api/generate-audio", &json!({ "text": "Warm up" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({ "error": "Deepgram TTS failed." }));
    }

    // -----------------------------------------------------------------------
    // generate-image
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn image_uses_exercise_style_for_exercise_type() {
        let images = Arc::new(FakeImages::default());
        let (status, json) = post_json(
            working_services(images.clone()),
            "/api/generate-image",
            &json!({ "prompt": "Goblet squat", "type": "exercise" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["imageUrl"], "data:image/png;base64,iVBORw0KGgo=");

        let prompts = images.prompts.lock().unwrap();
        assert!(
            prompts[0].starts_with("high quality fitness exercise illustration of Goblet squat")
        );
    }

    #[tokio::test]
    async fn image_defaults_to_meal_style() {
        let images = Arc::new(FakeImages::default());
        for kind in [json!("diet"), Value::Null] {
            let (status, _) = post_json(
                working_services(images.clone()),
                "/api/generate-image",
                &json!({ "prompt": "Lentil soup", "type": kind }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
        let prompts = images.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(
            prompts
                .iter()
                .all(|p| p.starts_with("high quality food photography of Lentil soup"))
        );
    }

    #[tokio::test]
    async fn image_requires_prompt() {
        let images = Arc::new(FakeImages::default());
        let (status, json) = post_json(
            working_services(images.clone()),
            "/api/generate-image",
            &json!({ "prompt": "  ", "type": "exercise" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Prompt missing");
        assert!(images.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_failure_carries_detail() {
        let images = Arc::new(FakeImages {
            reject: true,
            ..Default::default()
        });
        let (status, json) = post_json(
            working_services(images),
            "/api/generate-image",
            &json!({ "prompt": "Burger", "type": "meal" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Image API failed");
        assert_eq!(json["detail"], "content filtered");
    }

    #[tokio::test]
    async fn image_without_key_is_config_error() {
        let (status, json) = post_json(
            unconfigured_services(),
            "/api/generate-image",
            &json!({ "prompt": "Oats" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Missing Stability API key");
    }
}
