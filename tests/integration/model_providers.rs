//! Generation service over scripted and real provider clients

use super::test_utils::{requested_title, Behavior, ScriptedProvider};
use postsmith::config::{GeneratorConfig, ProviderType};
use postsmith::error::PipelineError;
use postsmith::prompt::generation_prompt;
use postsmith::provider::{
    BackoffPolicy, GenerationService, ModelProvider, OllamaApi, OllamaClient, ProviderFactory,
};
use postsmith::quality::QualityGate;
use std::sync::Arc;
use std::time::Duration;

fn sections() -> Vec<String> {
    QualityGate::default().required_sections
}

#[tokio::test]
async fn test_service_returns_article_for_prompt() {
    let provider = ScriptedProvider::new(Behavior::Good);
    let service = GenerationService::new(provider.clone()).with_pacing(Duration::ZERO);

    let prompt = generation_prompt("# A\n## B\n### Weights", "intro, A, B", "Weights", &sections());
    let article = service.generate(&prompt.system, &prompt.user).await.unwrap();

    assert!(article.starts_with("# Weights"));
    assert!(QualityGate::default().evaluate(&article).accepted);
    assert_eq!(requested_title(&provider.prompts()[0]), "Weights");
    assert_eq!(service.generator_id(), "scripted-model");
    assert_eq!(service.provider_name(), "scripted");
}

#[tokio::test]
async fn test_service_exhausts_retries_on_transport_errors() {
    let provider = ScriptedProvider::new(Behavior::Unreachable);
    let service = GenerationService::new(provider.clone())
        .with_policy(BackoffPolicy::new(3, Duration::ZERO))
        .with_pacing(Duration::ZERO);

    let err = service.generate("system", "user").await.unwrap_err();
    match err {
        PipelineError::GenerationUnavailable { attempts, last_error } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("connection refused"));
        }
        other => panic!("Expected GenerationUnavailable, got {:?}", other),
    }
    assert_eq!(provider.calls(), 3);
}

#[test]
fn test_default_config_builds_ollama_chat_client() {
    let config = GeneratorConfig::default();
    let client = ProviderFactory::create_client(&config.to_model_provider(), config.request_timeout())
        .unwrap();
    assert_eq!(client.provider_name(), "ollama");
    assert_eq!(client.model_name(), "llama3:latest");
}

#[test]
fn test_endpoint_path_selects_ollama_api() {
    let client = OllamaClient::new(
        "llama3".to_string(),
        Some("http://localhost:11434/api/generate".to_string()),
        OllamaApi::Chat,
        Duration::from_secs(5),
    )
    .unwrap();
    assert_eq!(client.api(), OllamaApi::Generate);
    assert_eq!(client.base_url(), "http://localhost:11434");

    let client = OllamaClient::new(
        "llama3".to_string(),
        Some("http://localhost:11434".to_string()),
        OllamaApi::Generate,
        Duration::from_secs(5),
    )
    .unwrap();
    assert_eq!(client.api(), OllamaApi::Generate);
}

#[test]
fn test_openai_compatible_config_builds_client() {
    let config = GeneratorConfig {
        provider: ProviderType::OpenAI,
        model: "gpt-4o-mini".to_string(),
        endpoint: Some("http://localhost:8080/v1".to_string()),
        api_key: Some("sk-test".to_string()),
        ..GeneratorConfig::default()
    };
    assert!(matches!(config.to_model_provider(), ModelProvider::OpenAI { .. }));

    let client = ProviderFactory::create_client(&config.to_model_provider(), Duration::from_secs(5))
        .unwrap();
    assert_eq!(client.provider_name(), "openai");
    assert_eq!(client.model_name(), "gpt-4o-mini");
}

#[tokio::test]
async fn test_closed_port_becomes_generation_unavailable() {
    // Port 9 (discard) is not served on loopback in test environments.
    let client = OllamaClient::new(
        "llama3".to_string(),
        Some("http://127.0.0.1:9/api/chat".to_string()),
        OllamaApi::Chat,
        Duration::from_secs(5),
    )
    .unwrap();
    let service = GenerationService::new(Arc::new(client))
        .with_policy(BackoffPolicy::new(2, Duration::ZERO))
        .with_pacing(Duration::ZERO);

    let err = service.generate("system", "user").await.unwrap_err();
    assert!(matches!(err, PipelineError::GenerationUnavailable { attempts: 2, .. }));
}
