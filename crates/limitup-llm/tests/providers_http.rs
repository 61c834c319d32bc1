//! Wire-level tests for each LLM provider against a mock server.

use std::io::Write;
use std::time::Duration;

use limitup_llm::{
    ClaudeProvider, GeminiProvider, GenerationSettings, LlmError, LlmProvider, LocalProvider,
    OpenAiProvider,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(model: &str) -> GenerationSettings {
    GenerationSettings {
        model: model.to_string(),
        temperature: 0.1,
        max_tokens: 4000,
        timeout: Duration::from_secs(5),
        pdf_timeout: Duration::from_secs(5),
    }
}

fn sample_pdf() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"%PDF-1.4 sample").unwrap();
    file
}

#[tokio::test]
async fn openai_sends_prompt_as_system_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_tokens": 4000,
            "messages": [
                {"role": "system", "content": "PROMPT"},
                {"role": "user", "content": "REPORT"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("sk-test", server.uri(), settings("gpt-4o")).unwrap();
    let reply = provider.analyze_text("REPORT", "PROMPT").await.unwrap();
    assert_eq!(reply, "{\"ok\": true}");
}

#[tokio::test]
async fn openai_pdf_is_sent_as_data_url() {
    let server = MockServer::start().await;
    // base64 of "%PDF-1.4 sample"
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "PROMPT"},
                    {"type": "image_url", "image_url": {"url": "data:application/pdf;base64,JVBERi0xLjQgc2FtcGxl"}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "{}"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pdf = sample_pdf();
    let provider = OpenAiProvider::new("sk-test", server.uri(), settings("gpt-4o")).unwrap();
    assert_eq!(provider.analyze_pdf(pdf.path(), "PROMPT").await.unwrap(), "{}");
}

#[tokio::test]
async fn openai_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("sk-test", server.uri(), settings("gpt-4o")).unwrap();
    match provider.analyze_text("t", "p").await {
        Err(LlmError::Api { status, body, .. }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn claude_sends_single_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ck-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": "PROMPT\n\n以下是需要分析的财务报告内容:\nREPORT"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "{\"a\": 1}"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        ClaudeProvider::new("ck-test", server.uri(), settings("claude-3-sonnet-20240229")).unwrap();
    assert_eq!(
        provider.analyze_text("REPORT", "PROMPT").await.unwrap(),
        "{\"a\": 1}"
    );
    let pdf = sample_pdf();
    assert!(matches!(
        provider.analyze_pdf(pdf.path(), "PROMPT").await,
        Err(LlmError::PdfUnsupported { .. })
    ));
}

#[tokio::test]
async fn gemini_retries_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .and(query_param("key", "gk-test"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": {"maxOutputTokens": 4000}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"g\": 1}"}]}}]
        })))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new("gk-test", server.uri(), settings("gemini-1.5-pro"), 3)
        .unwrap()
        .without_fallbacks()
        .with_retry_delay(Duration::from_millis(1));
    assert_eq!(provider.analyze_text("t", "p").await.unwrap(), "{\"g\": 1}");
}

#[tokio::test]
async fn gemini_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new("gk-test", server.uri(), settings("gemini-1.5-pro"), 2)
        .unwrap()
        .without_fallbacks()
        .with_retry_delay(Duration::from_millis(1));
    assert!(matches!(
        provider.analyze_text("t", "p").await,
        Err(LlmError::Api { status: 500, .. })
    ));
}

#[tokio::test]
async fn gemini_pdf_is_inline_and_tried_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [
                {"text": "PROMPT"},
                {"inline_data": {"mime_type": "application/pdf", "data": "JVBERi0xLjQgc2FtcGxl"}}
            ]}]
        })))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let pdf = sample_pdf();
    let provider = GeminiProvider::new("gk-test", server.uri(), settings("gemini-1.5-pro"), 3)
        .unwrap()
        .without_fallbacks()
        .with_retry_delay(Duration::from_millis(1));
    assert!(provider.analyze_pdf(pdf.path(), "PROMPT").await.is_err());
}

#[tokio::test]
async fn local_generate_and_probe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "qwen2.5:14b",
            "stream": false,
            "options": {"num_predict": 4000}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "{\"l\": 1}",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(LocalProvider::probe(&server.uri()).await);
    let provider = LocalProvider::new(server.uri(), settings("qwen2.5:14b")).unwrap();
    assert_eq!(provider.analyze_text("t", "p").await.unwrap(), "{\"l\": 1}");
}

#[tokio::test]
async fn local_probe_fails_without_server() {
    assert!(!LocalProvider::probe("http://127.0.0.1:9").await);
}
