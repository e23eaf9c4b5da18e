use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use langextract_llamacpp::core::client::ClientError;
use langextract_llamacpp::models::extraction::{ExampleData, Extraction};
use langextract_llamacpp::{
    InferenceError, InferenceOptions, LanguageModel, LlamaCppProvider, LlamaCppSchema,
    ModelConfig, ProviderKwargs, ProviderRegistry,
};
use serde_json::json;
use std::time::Duration;

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 0,
        "model": "llama-3-8b",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
    })
}

fn kwargs(server: &MockServer) -> ProviderKwargs {
    ProviderKwargs {
        model_id: Some("llama-3-8b".to_string()),
        api_key: Some("secret".to_string()),
        base_url: Some(server.base_url()),
        ..Default::default()
    }
}

#[tokio::test]
async fn infer_returns_trimmed_output() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer secret")
            .json_body_partial(r#"{"model": "llama-3-8b", "max_tokens": 32768}"#);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(completion("  hello there \n"));
    });

    let provider = LlamaCppProvider::new(kwargs(&server)).await.unwrap();
    let results = provider
        .infer(&["Say hello".to_string()], &InferenceOptions::default())
        .await
        .unwrap();

    mock.assert();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].len(), 1);
    assert_eq!(results[0][0].output, "hello there");
    assert_eq!(results[0][0].score, 1.0);
}

#[tokio::test]
async fn first_served_model_used_when_unset() {
    let server = MockServer::start_async().await;
    let models = server.mock(|when, then| {
        when.method(GET)
            .path("/models")
            .header("authorization", "Bearer secret");
        then.status(200).json_body(json!({
            "object": "list",
            "data": [
                {"id": "llama-3.2-1b-instruct-q4", "object": "model", "owned_by": "llamacpp"},
                {"id": "other", "object": "model"}
            ]
        }));
    });

    let provider = LlamaCppProvider::new(ProviderKwargs {
        model_id: None,
        ..kwargs(&server)
    })
    .await
    .unwrap();

    models.assert();
    assert_eq!(provider.model_id(), "llama-3.2-1b-instruct-q4");
}

#[tokio::test]
async fn empty_model_list_is_config_error() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/models");
        then.status(200).json_body(json!({"object": "list", "data": []}));
    });

    let err = LlamaCppProvider::new(ProviderKwargs {
        model_id: None,
        ..kwargs(&server)
    })
    .await
    .unwrap_err();

    match err {
        InferenceError::Config(message) => assert!(message.contains("No models available")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(401).body(
            r#"{"error":{"code":401,"message":"Invalid API Key","type":"authentication_error"}}"#,
        );
    });

    let provider = LlamaCppProvider::new(kwargs(&server)).await.unwrap();
    let err = provider
        .infer(&["hi".to_string()], &InferenceOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("llama.cpp API error"));
    match err {
        InferenceError::Runtime { provider, source } => {
            assert_eq!(provider, "llama.cpp");
            assert!(matches!(source, ClientError::Authentication(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn null_content_is_runtime_error() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(json!({
            "id": "c",
            "model": "llama",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}}]
        }));
    });

    let provider = LlamaCppProvider::new(kwargs(&server)).await.unwrap();
    let err = provider
        .infer(&["hi".to_string()], &InferenceOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        InferenceError::Runtime {
            source: ClientError::EmptyResponse,
            ..
        }
    ));
}

#[tokio::test]
async fn options_and_extra_reach_request_body() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .json_body_partial(
                r#"{"temperature": 0.25, "max_tokens": 64, "top_p": 0.5, "seed": 7}"#,
            );
        then.status(200).json_body(completion("ok"));
    });

    let mut extra = serde_json::Map::new();
    extra.insert("seed".to_string(), json!(7));
    let options = InferenceOptions {
        temperature: Some(0.25),
        max_output_tokens: Some(64),
        top_p: Some(0.5),
        extra,
    };

    let provider = LlamaCppProvider::new(kwargs(&server)).await.unwrap();
    provider.infer(&["hi".to_string()], &options).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn schema_sets_response_format() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains(r#""response_format""#)
            .body_contains(r#""json_schema""#)
            .body_contains(r#""medication""#);
        then.status(200)
            .json_body(completion(r#"{"extractions": [{"medication": "aspirin"}]}"#));
    });

    let examples = vec![ExampleData {
        text: "Take aspirin daily".to_string(),
        extractions: vec![Extraction::new("medication", "aspirin")],
    }];
    let schema = LlamaCppSchema::from_examples(&examples, None).unwrap();

    let mut provider = LlamaCppProvider::new(kwargs(&server)).await.unwrap();
    provider.apply_schema(Some(&schema));
    let results = provider
        .infer(&["Take aspirin daily".to_string()], &InferenceOptions::default())
        .await
        .unwrap();

    mock.assert();
    let parsed: serde_json::Value = serde_json::from_str(&results[0][0].output).unwrap();
    assert_eq!(parsed["extractions"][0]["medication"], "aspirin");
}

#[tokio::test]
async fn concurrent_batch_preserves_prompt_order() {
    let server = MockServer::start_async().await;
    let slow = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("first prompt");
        then.status(200)
            .delay(Duration::from_millis(300))
            .json_body(completion("first"));
    });
    let fast = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("second prompt");
        then.status(200).json_body(completion("second"));
    });

    let provider = LlamaCppProvider::new(ProviderKwargs {
        max_workers: Some(4),
        ..kwargs(&server)
    })
    .await
    .unwrap();

    let results = provider
        .infer(
            &["first prompt".to_string(), "second prompt".to_string()],
            &InferenceOptions::default(),
        )
        .await
        .unwrap();

    slow.assert();
    fast.assert();
    let outputs: Vec<&str> = results.iter().map(|r| r[0].output.as_str()).collect();
    assert_eq!(outputs, vec!["first", "second"]);
}

#[tokio::test]
async fn registry_routes_llama_model_to_server() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .json_body_partial(r#"{"model": "llama"}"#);
        then.status(200).json_body(completion("routed"));
    });

    let registry = ProviderRegistry::with_builtin();
    let model = registry
        .create_model(ModelConfig {
            model_id: Some("llama".to_string()),
            provider: None,
            provider_kwargs: ProviderKwargs {
                model_id: None,
                ..kwargs(&server)
            },
        })
        .await
        .unwrap();

    assert_eq!(model.provider_name(), "llama.cpp");
    let results = model
        .infer(&["Say hello".to_string()], &InferenceOptions::default())
        .await
        .unwrap();
    mock.assert();
    assert_eq!(results[0][0].output, "routed");
}

#[tokio::test]
async fn registry_declines_non_llama_model() {
    let registry = ProviderRegistry::with_builtin();
    let result = registry.create_model(ModelConfig::for_model("gpt-4o")).await;
    match result {
        Err(InferenceError::Config(message)) => assert!(message.contains("gpt-4o")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("gpt-4o should not route to llama.cpp"),
    }
}

async fn status_error(status: u16, body: &str) -> ClientError {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(status).body(body);
    });

    let provider = LlamaCppProvider::new(kwargs(&server)).await.unwrap();
    match provider
        .infer(&["hi".to_string()], &InferenceOptions::default())
        .await
    {
        Err(InferenceError::Runtime { source, .. }) => source,
        Err(other) => panic!("unexpected error: {other}"),
        Ok(outputs) => panic!("expected failure, got {outputs:?}"),
    }
}

#[tokio::test]
async fn rate_limit_status_maps_to_rate_limit() {
    let err = status_error(429, "too many requests").await;
    assert!(matches!(err, ClientError::RateLimit(_)));
}

#[tokio::test]
async fn bad_request_status_maps_to_bad_request() {
    let err = status_error(400, "invalid json").await;
    assert!(matches!(err, ClientError::BadRequest(_)));
}

#[tokio::test]
async fn service_unavailable_maps_to_unavailable() {
    let err = status_error(503, r#"{"error":{"message":"Loading model"}}"#).await;
    match err {
        ClientError::Unavailable(message) => assert!(message.contains("still loading")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn other_status_maps_to_api_error() {
    let err = status_error(500, "segfault in sampler").await;
    match err {
        ClientError::ApiError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "segfault in sampler");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn failure_mid_batch_aborts_batch() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("good prompt");
        then.status(200).json_body(completion("fine"));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("bad prompt");
        then.status(500).body("boom");
    });

    let provider = LlamaCppProvider::new(kwargs(&server)).await.unwrap();
    let prompts = vec![
        "good prompt".to_string(),
        "bad prompt".to_string(),
        "good prompt again".to_string(),
    ];
    let err = provider
        .infer(&prompts, &InferenceOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InferenceError::Runtime {
            source: ClientError::ApiError { status: 500, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn schema_preset_through_kwargs_reaches_request() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains(r#""json_schema""#)
            .body_contains(r#""city""#);
        then.status(200)
            .json_body(completion(r#"{"extractions": [{"city": "Paris"}]}"#));
    });

    let examples = vec![ExampleData {
        text: "Visited Paris".to_string(),
        extractions: vec![Extraction::new("city", "Paris")],
    }];
    let schema = LlamaCppSchema::from_examples(&examples, None).unwrap();

    let provider = LlamaCppProvider::new(kwargs(&server).with_schema(&schema))
        .await
        .unwrap();
    assert!(provider.structured_output());

    provider
        .infer(&["Visited Paris".to_string()], &InferenceOptions::default())
        .await
        .unwrap();
    mock.assert();
}
