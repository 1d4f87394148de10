//! End-to-end streaming scenarios.

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;

use strux::prelude::*;
use strux::providers::ScriptedProvider;
use strux::{FinishReason, StreamEvent};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("strux=debug")
        .with_test_writer()
        .try_init();
}

fn chunks(parts: &[&str]) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = parts
        .iter()
        .map(|p| StreamEvent::TextDelta((*p).to_string()))
        .collect();
    events.push(StreamEvent::Done(Some(FinishReason::Stop)));
    events
}

fn item_schema() -> SchemaDescriptor {
    let item = SchemaDescriptor::object("Task")
        .field("id", FieldSpec::integer())
        .field("label", FieldSpec::string())
        .build();
    SchemaDescriptor::list_of("Tasks", FieldSpec::object(item))
}

#[tokio::test]
async fn collection_items_arrive_one_per_chunk() {
    init_tracing();
    let provider = ScriptedProvider::new().then_events(chunks(&[
        r#"[{"id": 1, "label": "draft"}"#,
        r#", {"id": 2, "label": "review"}"#,
        r#", {"id": 3, "label": "ship"}]"#,
    ]));
    let extractor = Extractor::new(provider, item_schema()).with_mode(Mode::Json);

    let updates: Vec<_> = extractor
        .extract_stream(&Conversation::from_user("list the tasks"))
        .collect()
        .await;
    let updates: Vec<StreamUpdate> = updates.into_iter().map(Result::unwrap).collect();

    assert_eq!(
        updates,
        vec![
            StreamUpdate::Item {
                index: 0,
                value: json!({"id": 1, "label": "draft"}),
            },
            StreamUpdate::Item {
                index: 1,
                value: json!({"id": 2, "label": "review"}),
            },
            StreamUpdate::Item {
                index: 2,
                value: json!({"id": 3, "label": "ship"}),
            },
            StreamUpdate::Final(json!([
                {"id": 1, "label": "draft"},
                {"id": 2, "label": "review"},
                {"id": 3, "label": "ship"},
            ])),
        ]
    );
}

#[tokio::test]
async fn partial_object_snapshots_never_regress() {
    init_tracing();
    let schema = SchemaDescriptor::object("Person")
        .field("name", FieldSpec::string())
        .field("age", FieldSpec::integer())
        .build();
    let provider = ScriptedProvider::new().then_events(chunks(&[
        "{\"name\": \"Grace Ho",
        "pper\", \"age\": 4",
        "5}",
    ]));
    let extractor = Extractor::new(provider, schema).with_mode(Mode::Json);

    let updates: Vec<_> = extractor
        .extract_stream(&Conversation::from_user("who?"))
        .collect()
        .await;
    let updates: Vec<StreamUpdate> = updates.into_iter().map(Result::unwrap).collect();

    // once "name" closed, its value stayed fixed in every later update
    let mut closed_name: Option<serde_json::Value> = None;
    for update in &updates {
        let value = match update {
            StreamUpdate::Snapshot(v) | StreamUpdate::Final(v) => v,
            StreamUpdate::Item { value, .. } => value,
        };
        if let Some(expected) = &closed_name {
            assert_eq!(&value["name"], expected);
        } else if value.get("age").is_some() {
            // age only appears after the name string was terminated
            closed_name = Some(value["name"].clone());
        }
    }
    assert_eq!(closed_name, Some(json!("Grace Hopper")));
    assert_eq!(
        updates.last(),
        Some(&StreamUpdate::Final(json!({"name": "Grace Hopper", "age": 45})))
    );
}

#[tokio::test]
async fn terminal_validation_failure_reasks_and_finalizes_once() {
    init_tracing();
    let schema = SchemaDescriptor::object("Person")
        .field("name", FieldSpec::string())
        .field("age", FieldSpec::integer())
        .build();
    let provider = ScriptedProvider::new()
        .then_events(chunks(&["{\"name\": \"Grace\"}"]))
        .then_text("{\"name\": \"Grace\", \"age\": 45}");
    let extractor = Extractor::new(provider.clone(), schema)
        .with_mode(Mode::Json)
        .with_max_retries(1);

    let updates: Vec<_> = extractor
        .extract_stream(&Conversation::from_user("who?"))
        .collect()
        .await;
    let updates: Vec<StreamUpdate> = updates.into_iter().map(Result::unwrap).collect();

    let finals: Vec<_> = updates
        .iter()
        .filter(|u| matches!(u, StreamUpdate::Final(_)))
        .collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(
        updates.last(),
        Some(&StreamUpdate::Final(json!({"name": "Grace", "age": 45})))
    );
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn backpressure_does_not_drop_updates() {
    init_tracing();
    let provider = ScriptedProvider::new().then_events(chunks(&[
        r#"[{"id": 1, "label": "a"}"#,
        r#", {"id": 2, "label": "b"}"#,
        r#", {"id": 3, "label": "c"}"#,
        r#", {"id": 4, "label": "d"}]"#,
    ]));
    let extractor = Extractor::new(provider, item_schema())
        .with_mode(Mode::Json)
        .with_queue_capacity(1);

    let mut stream = extractor.extract_stream(&Conversation::from_user("tasks"));
    let mut items = 0;
    let mut finals = 0;
    while let Some(update) = stream.next().await {
        // a deliberately slow consumer
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        match update.unwrap() {
            StreamUpdate::Item { .. } => items += 1,
            StreamUpdate::Final(_) => finals += 1,
            StreamUpdate::Snapshot(_) => {}
        }
    }
    assert_eq!(items, 4);
    assert_eq!(finals, 1);
}
