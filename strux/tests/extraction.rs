//! End-to-end extraction scenarios against scripted providers.

use pretty_assertions::assert_eq;
use serde_json::json;

use strux::prelude::*;
use strux::providers::{ProviderError, ScriptedProvider};
use strux::{ExtractionMetrics, RawCompletion, Role};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("strux=debug")
        .with_test_writer()
        .try_init();
}

fn person_schema() -> SchemaDescriptor {
    SchemaDescriptor::object("Person")
        .field("name", FieldSpec::string().with_rule(rules::min_length(2)))
        .field("age", FieldSpec::integer().with_rule(rules::minimum(0.0)))
        .build()
}

#[tokio::test]
async fn invalid_then_corrected_succeeds_on_second_attempt() {
    init_tracing();
    let provider = ScriptedProvider::new()
        .then_tool_call("person", r#"{"name": "Ada", "age": -5}"#)
        .then_tool_call("person", r#"{"name": "Ada", "age": 36}"#);
    let extractor = Extractor::new(provider.clone(), person_schema()).with_max_retries(2);

    let extraction = extractor
        .extract(&Conversation::from_user("Ada is 36 years old."))
        .await
        .unwrap();

    assert_eq!(extraction.instance, json!({"name": "Ada", "age": 36}));
    assert_eq!(extraction.attempts.len(), 1);
    assert_eq!(provider.request_count(), 2);

    // the corrective follow-up echoes the bad output and quotes the errors
    let second = &provider.recorded_requests()[1];
    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.messages[0].role, Role::User);
    assert_eq!(second.messages[1].role, Role::Assistant);
    assert_eq!(
        second.messages[1].text_content(),
        r#"{"name": "Ada", "age": -5}"#
    );
    assert_eq!(second.messages[2].role, Role::User);
    assert!(second.messages[2]
        .text_content()
        .contains("age: must be at least 0"));
}

#[tokio::test]
async fn zero_retries_exhausts_with_exactly_one_attempt() {
    init_tracing();
    let provider = ScriptedProvider::new()
        .then_tool_call("person", r#"{"name": "Ada"}"#)
        .then_tool_call("person", r#"{"name": "Ada", "age": 36}"#);
    let extractor = Extractor::new(provider.clone(), person_schema()).with_max_retries(0);

    let err = extractor
        .extract(&Conversation::from_user("Ada is 36"))
        .await
        .unwrap_err();

    let attempts = err.attempts().expect("exhausted carries the trail");
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].index, 0);
    // the scripted correction was never requested
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn retry_budget_bounds_total_attempts() {
    init_tracing();
    let provider = ScriptedProvider::new()
        .then_tool_call("person", r#"{"name": "Ada"}"#)
        .then_tool_call("person", r#"{"name": "Ada"}"#)
        .then_tool_call("person", r#"{"name": "Ada"}"#)
        .then_tool_call("person", r#"{"name": "Ada"}"#);
    let extractor = Extractor::new(provider.clone(), person_schema()).with_max_retries(2);

    let err = extractor
        .extract(&Conversation::from_user("Ada is 36"))
        .await
        .unwrap_err();

    let attempts = err.attempts().unwrap();
    assert_eq!(attempts.len(), 3);
    assert_eq!(provider.request_count(), 3);
    assert_eq!(
        attempts.iter().map(|a| a.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[tokio::test]
async fn all_missing_fields_are_reported_together() {
    init_tracing();
    let provider = ScriptedProvider::new().then_tool_call("person", r#"{}"#);
    let extractor = Extractor::new(provider, person_schema()).with_max_retries(0);

    let err = extractor
        .extract(&Conversation::from_user("Ada is 36"))
        .await
        .unwrap_err();

    let errors = &err.attempts().unwrap()[0].errors;
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].path, "name");
    assert_eq!(errors[1].path, "age");
}

#[tokio::test]
async fn modes_read_only_their_own_channel() {
    init_tracing();
    // one completion carrying both channels, with different payloads
    let both = || RawCompletion {
        text: r#"{"name": "TextAda", "age": 1}"#.to_string(),
        tool_calls: vec![strux::ToolCall::new(
            "person",
            r#"{"name": "ToolAda", "age": 2}"#,
        )],
        finish_reason: None,
        raw: serde_json::Value::Null,
    };

    let tool_provider = ScriptedProvider::new().then_completion(both());
    let tool_result = Extractor::new(tool_provider, person_schema())
        .with_mode(Mode::ToolCall)
        .extract(&Conversation::from_user("x"))
        .await
        .unwrap();
    assert_eq!(tool_result.instance["name"], "ToolAda");

    let json_provider = ScriptedProvider::new().then_completion(both());
    let json_result = Extractor::new(json_provider, person_schema())
        .with_mode(Mode::Json)
        .extract(&Conversation::from_user("x"))
        .await
        .unwrap();
    assert_eq!(json_result.instance["name"], "TextAda");
}

#[tokio::test]
async fn transport_failures_do_not_spend_the_budget() {
    init_tracing();
    let provider = ScriptedProvider::new()
        .then_tool_call("person", r#"{"name": "Ada"}"#)
        .then_error(ProviderError::Transport("connection reset".to_string()));
    let metrics = ExtractionMetrics::new();
    let extractor = Extractor::new(provider.clone(), person_schema())
        .with_max_retries(5)
        .with_metrics(metrics.clone());

    let err = extractor
        .extract(&Conversation::from_user("Ada is 36"))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Transport { .. }));
    // the validation failure recorded before the fault is still attached
    let attempts = err.attempts().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].index, 0);
    assert_eq!(provider.request_count(), 2);
    assert_eq!(metrics.snapshot().transport_errors, 1);
    assert_eq!(metrics.snapshot().exhausted, 0);
}

#[tokio::test]
async fn context_rules_see_caller_data() {
    init_tracing();
    let schema = SchemaDescriptor::object("Answer")
        .field(
            "quote",
            FieldSpec::string().with_rule(rules::substring_of("document", 0.8)),
        )
        .build();
    let context =
        ValidationContext::with("document", "The quick brown fox jumps over the lazy dog.");

    let provider = ScriptedProvider::new()
        .then_tool_call("answer", r#"{"quote": "a purple elephant"}"#)
        .then_tool_call("answer", r#"{"quote": "quick brown fox"}"#);
    let extractor = Extractor::new(provider, schema)
        .with_context(context)
        .with_max_retries(1);

    let extraction = extractor
        .extract(&Conversation::from_user("What jumps over the dog?"))
        .await
        .unwrap();
    assert_eq!(extraction.instance["quote"], "quick brown fox");
    assert_eq!(extraction.attempts.len(), 1);
}
