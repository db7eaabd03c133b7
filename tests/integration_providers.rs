#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Full pipeline against mocked Gemini and Google Translate endpoints

use std::fs;

use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yogurt_chef::RecipeError;
use yogurt_chef::commands::Pipeline;
use yogurt_chef::config::{Config, HttpConfig, TranslationMode};
use yogurt_chef::language::Language;
use yogurt_chef::providers::{Credentials, GOOGLE_API_KEY_VAR};

const DIMENSION: usize = 8;

fn credentials() -> Credentials {
    Credentials::from_lookup(|name| (name == GOOGLE_API_KEY_VAR).then(|| "test-key".to_string()))
}

fn config_for(server: &MockServer, temp_dir: &TempDir) -> Config {
    let corpus = temp_dir.path().join("tarifler.txt");
    fs::write(&corpus, "Yoğurt çorbası: iki su bardağı yoğurdu dereotu ile çırpın.")
        .expect("should write corpus");

    let base = Url::parse(&server.uri()).expect("mock server uri is valid");
    let mut config = Config::with_base_dir(temp_dir.path());
    config.corpus.path = corpus;
    config.embedding.dimension = DIMENSION as u32;
    config.endpoints.gemini = base.clone();
    config.endpoints.translate = base;
    config.http = HttpConfig {
        timeout_seconds: 5,
        retry_attempts: 1,
    };
    config
}

fn embedding_response() -> ResponseTemplate {
    let values: Vec<f32> = (0..DIMENSION).map(|i| i as f32 / 10.0).collect();
    ResponseTemplate::new(200).set_body_json(json!({ "embedding": { "values": values } }))
}

async fn mount_generation(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Malzemeler: yoğurt, dereotu." }] }
            }]
        })))
        .mount(server)
        .await;
}

fn translation(text: &str, original: &str, source: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!([[[text, original, null, null, 10]], null, source]))
}

#[test]
fn missing_google_key_blocks_startup() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::with_base_dir(temp_dir.path());

    let result = Pipeline::from_config(config, &Credentials::default());
    assert!(matches!(result, Err(RecipeError::Configuration(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn english_question_gets_english_answer() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("should create temp dir");

    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(embedding_response())
        .mount(&server)
        .await;
    mount_generation(&server).await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("sl", "auto"))
        .and(query_param("tl", "tr"))
        .respond_with(translation("yoğurt dereotu çorba", "yogurt dill soup", "en"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("sl", "tr"))
        .and(query_param("tl", "en"))
        .and(query_param("q", "Malzemeler: yoğurt, dereotu."))
        .respond_with(translation(
            "Ingredients: yogurt, dill.",
            "Malzemeler: yoğurt, dereotu.",
            "tr",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server, &temp_dir);
    let index_dir = config.index_path();

    let recommendation = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::from_config(config, &credentials())?;
        let assistant = pipeline.assistant()?;
        assistant.recommend("yogurt dill soup", Language::English)
    })
    .await
    .expect("task should join")
    .expect("recommendation should succeed");

    assert_eq!(recommendation.text, "Ingredients: yogurt, dill.");
    assert_eq!(recommendation.language, Language::English);
    assert_eq!(recommendation.sources.len(), 1);
    assert!(index_dir.join("manifest.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn quota_error_is_shown_as_answer() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("should create temp dir");

    // The corpus has a single chunk: one successful embedding for the build,
    // then the quota runs out
    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(embedding_response())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "error": { "message": "Resource has been exhausted" } })),
        )
        .mount(&server)
        .await;
    mount_generation(&server).await;

    let mut config = config_for(&server, &temp_dir);
    config.translation.mode = TranslationMode::Off;

    let (first, second) = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::from_config(config, &credentials())?;
        let assistant = pipeline.assistant()?;
        let first = assistant.respond("yoğurt dereotu", Language::Turkish);
        let second = assistant.respond("   ", Language::Turkish);
        Ok::<_, RecipeError>((first, second))
    })
    .await
    .expect("task should join")
    .expect("pipeline should start");

    assert!(first.starts_with("❌ "), "unexpected answer: {}", first);
    assert!(first.contains("quota exceeded"));
    assert_eq!(second, "❌ Please enter at least one ingredient");
}

#[tokio::test(flavor = "multi_thread")]
async fn index_is_built_once_per_pipeline() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("should create temp dir");

    // One call for the single chunk; later assistants reuse the shared index
    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .respond_with(embedding_response())
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server, &temp_dir);
    config.translation.mode = TranslationMode::Off;

    let chunk_count = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::from_config(config, &credentials())?;
        let first = pipeline.index()?;
        let _assistant = pipeline.assistant()?;
        let second = pipeline.index()?;
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(pipeline.config().embedding.dimension as usize, first.dimension());
        Ok::<_, RecipeError>(second.len())
    })
    .await
    .expect("task should join")
    .expect("index should build");

    assert_eq!(chunk_count, 1);
}
