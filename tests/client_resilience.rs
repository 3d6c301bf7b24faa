//! 远程客户端集成测试
//!
//! 使用 mockito 模拟 OpenAI 兼容接口，验证重试、校验和用量统计

use std::time::{Duration, Instant};

use mockito::{Matcher, Server};

use epub_translator::translation::{
    Fragment, LengthRatioValidator, OpenRouterClient, TranslationError, TranslatorClient,
    TranslatorConfig, ValidationError,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{completion_body, fragments, test_config};

#[test]
fn test_translates_single_chunk() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "mock-model",
            "response_format": { "type": "json_schema" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(&[("REF_000001", "Hola")], 10, 5))
        .expect(1)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let result = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap();

    mock.assert();
    assert_eq!(result, vec![Fragment::new("REF_000001", "Hola")]);
    assert_eq!(client.usage().total_tokens, 15);
}

#[test]
fn test_server_error_is_retried() {
    let mut server = Server::new();
    let failure = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream error")
        .expect(1)
        .create();
    let success = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(&[("REF_000001", "Hola")], 10, 5))
        .expect(1)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let result = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap();

    failure.assert();
    success.assert();
    assert_eq!(result[0].text, "Hola");
    // 失败的尝试不计入用量
    assert_eq!(client.usage().total_tokens, 15);
}

#[test]
fn test_rate_limit_is_retried_until_exhausted() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("slow down")
        .expect(3)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let error = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap_err();

    mock.assert();
    assert!(matches!(error, TranslationError::Http { status: 429, .. }));
}

#[test]
fn test_client_error_is_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(400)
        .with_body("bad request")
        .expect(1)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let error = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap_err();

    mock.assert();
    match error {
        TranslationError::Http { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "bad request");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_id_mismatch_retries_then_fails() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(&[("REF_999999", "Hola")], 10, 5))
        .expect(3)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let error = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap_err();

    mock.assert();
    match error {
        TranslationError::Validation(ValidationError::IdMismatch { missing, extra }) => {
            assert!(missing.contains("REF_000001"));
            assert!(extra.contains("REF_999999"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(client.usage().total_tokens, 0);
}

#[test]
fn test_malformed_content_is_not_retried() {
    let mut server = Server::new();
    let body = serde_json::json!({
        "choices": [{ "message": { "content": "Sorry, I cannot do that." } }]
    })
    .to_string();
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(body)
        .expect(1)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let error = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap_err();

    mock.assert();
    assert!(matches!(error, TranslationError::MalformedResponse(_)));
}

#[test]
fn test_fenced_json_content_is_accepted() {
    let mut server = Server::new();
    let body = serde_json::json!({
        "choices": [{ "message": {
            "content": "```json\n{\"elements\":[{\"id\":\"REF_000001\",\"text\":\"Hola\"}]}\n```"
        } }]
    })
    .to_string();
    let _mock1 = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(body)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let result = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap();

    assert_eq!(result[0].text, "Hola");
}

#[test]
fn test_chunks_are_sent_separately_and_usage_is_summed() {
    let mut server = Server::new();
    let first = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("REF_000001".to_string()))
        .with_status(200)
        .with_body(completion_body(
            &[("REF_000001", "Uno"), ("REF_000002", "Dos")],
            100,
            40,
        ))
        .expect(1)
        .create();
    let second = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("REF_000003".to_string()))
        .with_status(200)
        .with_body(completion_body(&[("REF_000003", "Tres")], 50, 20))
        .expect(1)
        .create();

    let config = TranslatorConfig {
        batch_size: 2,
        ..test_config(&server.url())
    };
    let mut client = OpenRouterClient::new(&config).unwrap();
    let result = client.translate_batch(&fragments(3), "spanish").unwrap();

    first.assert();
    second.assert();
    let texts: Vec<&str> = result.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(texts, vec!["Uno", "Dos", "Tres"]);

    let usage = client.usage();
    assert_eq!(usage.prompt_tokens, 150);
    assert_eq!(usage.completion_tokens, 60);
    assert_eq!(usage.total_tokens, 210);
}

#[test]
fn test_failed_chunk_discards_earlier_results() {
    let mut server = Server::new();
    let _mock2 = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("REF_000001".to_string()))
        .with_status(200)
        .with_body(completion_body(&[("REF_000001", "Uno")], 10, 5))
        .create();
    let _mock3 = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("REF_000002".to_string()))
        .with_status(403)
        .with_body("forbidden")
        .create();

    let config = TranslatorConfig {
        batch_size: 1,
        ..test_config(&server.url())
    };
    let mut client = OpenRouterClient::new(&config).unwrap();

    let result = client.translate_batch(&fragments(2), "spanish");
    assert!(matches!(result, Err(TranslationError::Http { status: 403, .. })));
}

#[test]
fn test_prices_are_fetched_once_and_applied() {
    let mut server = Server::new();
    let models = server
        .mock("GET", "/models")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "data": [
                    { "id": "other-model", "pricing": { "prompt": "9", "completion": "9" } },
                    { "id": "mock-model", "pricing": { "prompt": "2.0", "completion": "4.0" } }
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create();
    let _mock4 = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(&[("REF_000001", "Hola")], 1_000_000, 500_000))
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    client.fetch_model_prices();
    client.fetch_model_prices();

    models.assert();
    assert_eq!(client.prices().prompt_per_1m, 2.0);
    assert_eq!(client.prices().completion_per_1m, 4.0);

    client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap();
    assert!((client.usage().total_cost_usd - 4.0).abs() < 1e-9);
}

#[test]
fn test_unavailable_pricing_defaults_to_zero() {
    let mut server = Server::new();
    let _models = server.mock("GET", "/models").with_status(503).create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    client.fetch_model_prices();

    assert_eq!(client.prices().prompt_per_1m, 0.0);
    assert_eq!(client.prices().completion_per_1m, 0.0);
}

#[test]
fn test_transport_error_is_not_retried() {
    // 端口1上没有服务
    let mut client = OpenRouterClient::new(&test_config("http://127.0.0.1:1")).unwrap();

    let error = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap_err();

    assert!(matches!(error, TranslationError::Network(_)));
}

#[test]
fn test_custom_validator_replaces_default() {
    let mut server = Server::new();
    let runaway = "bla ".repeat(200);
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(&[("REF_000001", runaway.as_str())], 10, 5))
        .expect(3)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url()))
        .unwrap()
        .with_validator(LengthRatioValidator::default());

    let error = client
        .translate_batch(
            &[Fragment::new("REF_000001", "A sentence long enough to be checked.")],
            "spanish",
        )
        .unwrap_err();

    mock.assert();
    assert!(matches!(
        error,
        TranslationError::Validation(ValidationError::Rejected(_))
    ));
}

#[test]
fn test_duplicated_ids_are_retried_then_fail() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(
            &[("REF_000001", "Hola"), ("REF_000001", "Otra")],
            10,
            5,
        ))
        .expect(3)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let error = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap_err();

    mock.assert();
    match error {
        TranslationError::Validation(ValidationError::Duplicated(ids)) => {
            assert!(ids.contains("REF_000001"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(client.usage().total_tokens, 0);
}

#[test]
fn test_duplicate_reply_recovers_on_retry() {
    let mut server = Server::new();
    let duplicated = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(
            &[("REF_000001", "Hola"), ("REF_000001", "Otra")],
            10,
            5,
        ))
        .expect(1)
        .create();
    let clean = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(&[("REF_000001", "Hola")], 10, 5))
        .expect(1)
        .create();

    let mut client = OpenRouterClient::new(&test_config(&server.url())).unwrap();
    let result = client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap();

    duplicated.assert();
    clean.assert();
    assert_eq!(result, vec![Fragment::new("REF_000001", "Hola")]);
    assert_eq!(client.usage().total_tokens, 15);
}

#[test]
fn test_pause_between_chunks_but_not_after_last() {
    const DELAY_MS: u64 = 100;

    let mut server = Server::new();
    let mut mocks = Vec::new();
    for i in 1..=3 {
        let id = format!("REF_{:06}", i);
        mocks.push(
            server
                .mock("POST", "/chat/completions")
                .match_body(Matcher::Regex(id.clone()))
                .with_status(200)
                .with_body(completion_body(&[(id.as_str(), "ok")], 1, 1))
                .expect(1)
                .create(),
        );
    }

    let config = TranslatorConfig {
        batch_size: 1,
        batch_delay_ms: DELAY_MS,
        ..test_config(&server.url())
    };
    let mut client = OpenRouterClient::new(&config).unwrap();

    let started = Instant::now();
    let result = client.translate_batch(&fragments(3), "spanish").unwrap();
    let elapsed = started.elapsed();

    for mock in &mocks {
        mock.assert();
    }
    assert_eq!(result.len(), 3);
    assert!(elapsed >= Duration::from_millis(2 * DELAY_MS), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3 * DELAY_MS), "elapsed {:?}", elapsed);
}

#[test]
fn test_single_chunk_has_no_pause() {
    const DELAY_MS: u64 = 300;

    let mut server = Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion_body(&[("REF_000001", "Hola")], 1, 1))
        .expect(1)
        .create();

    let config = TranslatorConfig {
        batch_delay_ms: DELAY_MS,
        ..test_config(&server.url())
    };
    let mut client = OpenRouterClient::new(&config).unwrap();

    let started = Instant::now();
    client
        .translate_batch(&[Fragment::new("REF_000001", "Hello")], "spanish")
        .unwrap();

    mock.assert();
    assert!(started.elapsed() < Duration::from_millis(DELAY_MS));
}
