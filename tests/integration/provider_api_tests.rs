/*!
 * Integration tests for the OpenAI-compatible client against a local HTTP stub
 */

use wintrans::app_config::ProviderConfig;
use wintrans::errors::ProviderError;
use wintrans::providers::Provider;
use wintrans::providers::openai::OpenAI;

use crate::common::{json_response, spawn_http_server, sse_response};

fn provider_config(endpoint: String, stream: bool) -> ProviderConfig {
    ProviderConfig {
        endpoint,
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
        timeout_secs: 10,
        retry_count: 2,
        retry_backoff_ms: 10,
        stream,
        ..ProviderConfig::default()
    }
}

#[tokio::test]
async fn test_openAI_generate_withJsonResponse_shouldReturnMessageContent() {
    let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"【译文】\n你好"}}],"usage":{"prompt_tokens":5,"completion_tokens":3,"total_tokens":8}}"#;
    let (url, server) = spawn_http_server(vec![json_response("200 OK", body)]).await.unwrap();

    let client = OpenAI::from_config(&provider_config(url, false));
    let reply = client.generate("Xin chào").await.unwrap();
    assert_eq!(reply, "【译文】\n你好");

    let requests = server.await.unwrap();
    let request: serde_json::Value = serde_json::from_str(&requests[0]).unwrap();
    assert_eq!(request["model"], "test-model");
    assert_eq!(request["messages"][0]["role"], "user");
    assert_eq!(request["messages"][0]["content"], "Xin chào");
}

#[tokio::test]
async fn test_openAI_generate_withEventStream_shouldConcatenateDeltas() {
    let (url, server) = spawn_http_server(vec![sse_response(&["```\n【译", "文】\n你", "好\n```"])])
        .await
        .unwrap();

    let client = OpenAI::from_config(&provider_config(url, true));
    let reply = client.generate("Xin chào").await.unwrap();
    assert_eq!(reply, "```\n【译文】\n你好\n```");

    let requests = server.await.unwrap();
    let request: serde_json::Value = serde_json::from_str(&requests[0]).unwrap();
    assert_eq!(request["stream"], true);
}

#[tokio::test]
async fn test_openAI_generate_afterServerError_shouldRetry() {
    let ok = r#"{"choices":[{"message":{"role":"assistant","content":"done"}}]}"#;
    let (url, server) = spawn_http_server(vec![
        json_response("503 Service Unavailable", r#"{"error":"busy"}"#),
        json_response("200 OK", ok),
    ])
    .await
    .unwrap();

    let client = OpenAI::from_config(&provider_config(url, false));
    assert_eq!(client.generate("prompt").await.unwrap(), "done");
    assert_eq!(server.await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_openAI_generate_withUnauthorized_shouldFailWithoutRetry() {
    let (url, server) = spawn_http_server(vec![json_response("401 Unauthorized", r#"{"error":"bad key"}"#)])
        .await
        .unwrap();

    let client = OpenAI::from_config(&provider_config(url, false));
    let result = client.generate("prompt").await;
    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
    assert_eq!(server.await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_openAI_generate_withBadRequest_shouldReturnApiError() {
    let (url, _server) = spawn_http_server(vec![json_response("400 Bad Request", r#"{"error":"no"}"#)])
        .await
        .unwrap();

    let client = OpenAI::from_config(&provider_config(url, false));
    let result = client.generate("prompt").await;
    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 400, .. })));
}
