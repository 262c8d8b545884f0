mod common;

use common::{engine_with, RecordingHandler, ScriptedClassifier};
use serde_json::{json, Map, Value};
use vypar::config::DialogueConfig;
use vypar::intent::Category;
use vypar::storage::{ConversationStore, HistoryFilter, Role, TurnMetadata};
use vypar::{TurnRequest, TurnResponse};

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn create_customer(data: Value) -> Value {
    json!({"category": "customer", "intent": "create_customer", "data": data})
}

fn dispatched_meta() -> TurnMetadata {
    TurnMetadata {
        status: Some("dispatched".to_string()),
        ..TurnMetadata::default()
    }
}

#[tokio::test]
async fn test_create_customer_across_two_turns() {
    let classifier = ScriptedClassifier::new()
        .on("Create a customer", create_customer(json!({})))
        .on(
            "name Bob email bob@x.com phone 555",
            create_customer(json!({"name": "Bob", "email": "bob@x.com", "phone": "555"})),
        );
    let t = engine_with(
        classifier,
        vec![RecordingHandler::new(Category::Customer, json!({"id": "cust-1"}))],
        DialogueConfig::default(),
    );

    let first = t
        .engine
        .process(TurnRequest::new("Create a customer"), "tok", None)
        .await
        .unwrap();
    let conversation_id = first.conversation_id().unwrap().to_string();
    match &first {
        TurnResponse::MissingFields(r) => {
            assert_eq!(r.required_fields, vec!["name", "email", "phone"]);
            assert_eq!(
                r.message,
                "Please provide the following information: name, email, phone"
            );
        }
        other => panic!("expected missing_fields, got {:?}", other),
    }

    let second = t
        .engine
        .process(
            TurnRequest::new("name Bob email bob@x.com phone 555")
                .in_conversation(conversation_id.clone()),
            "tok",
            None,
        )
        .await
        .unwrap();

    assert_eq!(second.status(), "dispatched");
    assert_eq!(
        second.to_value(),
        json!({"id": "cust-1", "conversation_id": conversation_id})
    );

    let calls = t.handlers[0].calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "create_customer");
    assert_eq!(
        calls[0].1,
        object(json!({"name": "Bob", "email": "bob@x.com", "phone": "555"}))
    );

    let turns = t
        .storage
        .recent_history(HistoryFilter::conversation(&conversation_id), 10)
        .unwrap();
    let roles: Vec<Role> = turns.iter().map(|turn| turn.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn test_reasking_without_new_information_is_stable() {
    let classifier = ScriptedClassifier::new()
        .on("Create a customer", create_customer(json!({})))
        .on("hmm", create_customer(json!({})));
    let t = engine_with(
        classifier,
        vec![RecordingHandler::new(Category::Customer, json!({}))],
        DialogueConfig::default(),
    );

    let first = t
        .engine
        .process(TurnRequest::new("Create a customer").in_conversation("c1"), "tok", None)
        .await
        .unwrap();
    let second = t
        .engine
        .process(TurnRequest::new("hmm").in_conversation("c1"), "tok", None)
        .await
        .unwrap();

    match (first, second) {
        (TurnResponse::MissingFields(a), TurnResponse::MissingFields(b)) => {
            assert_eq!(a.required_fields, b.required_fields);
            assert_eq!(a.conversation_id, "c1");
            assert_eq!(b.conversation_id, "c1");
        }
        other => panic!("expected two clarifications, got {:?}", other),
    }
    assert!(t.handlers[0].calls().is_empty());
}

#[tokio::test]
async fn test_newest_recovered_value_wins() {
    let classifier = ScriptedClassifier::new().on("Create a customer", create_customer(json!({})));
    let t = engine_with(
        classifier,
        vec![RecordingHandler::new(Category::Customer, json!({}))],
        DialogueConfig::default(),
    );

    t.storage
        .append(
            "older",
            Role::Assistant,
            r#"{"data": {"phone": "111"}}"#,
            Some(&dispatched_meta()),
            Some("u1"),
        )
        .unwrap();
    t.storage
        .append(
            "newer",
            Role::Assistant,
            r#"{"data": {"phone": "222"}}"#,
            Some(&dispatched_meta()),
            Some("u1"),
        )
        .unwrap();

    let response = t
        .engine
        .process(
            TurnRequest::new("Create a customer").in_conversation("fresh"),
            "tok",
            Some("u1"),
        )
        .await
        .unwrap();

    match response {
        TurnResponse::Suggestion(r) => {
            assert_eq!(r.status, "suggested_data_with_missing_fields");
            assert_eq!(r.suggested_data, object(json!({"phone": "222"})));
            assert_eq!(
                r.remaining_fields,
                Some(vec!["name".to_string(), "email".to_string()])
            );
            assert_eq!(r.conversation_id, "fresh");
        }
        other => panic!("expected suggestion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_confirmation_merges_suggestion_without_reclassifying() {
    let classifier = ScriptedClassifier::new().on(
        "Create customer Bob 555",
        create_customer(json!({"name": "Bob", "phone": "555"})),
    );
    let t = engine_with(
        classifier,
        vec![RecordingHandler::new(Category::Customer, json!({"created": true}))],
        DialogueConfig::default(),
    );

    t.storage
        .append(
            "earlier",
            Role::Assistant,
            r#"{"data": {"email": "a@b.com"}}"#,
            Some(&dispatched_meta()),
            Some("u1"),
        )
        .unwrap();

    let first = t
        .engine
        .process(
            TurnRequest::new("Create customer Bob 555").in_conversation("c2"),
            "tok",
            Some("u1"),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), "suggested_data");

    let second = t
        .engine
        .process(TurnRequest::new("yes").in_conversation("c2"), "tok", Some("u1"))
        .await
        .unwrap();
    assert_eq!(second.status(), "dispatched");

    assert_eq!(t.classifier.calls(), vec!["Create customer Bob 555".to_string()]);
    let calls = t.handlers[0].calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1,
        object(json!({"name": "Bob", "phone": "555", "email": "a@b.com"}))
    );
}

#[tokio::test]
async fn test_additional_data_completes_pending_intent() {
    let classifier = ScriptedClassifier::new().on(
        "invoice please",
        json!({"category": "sales", "intent": "generate_invoice", "data": {"saleId": "s-9"}}),
    );
    let t = engine_with(
        classifier,
        vec![RecordingHandler::new(Category::Sales, json!({"sent": true}))],
        DialogueConfig::default(),
    );

    let first = t
        .engine
        .process(TurnRequest::new("invoice please").in_conversation("c3"), "tok", None)
        .await
        .unwrap();
    match &first {
        TurnResponse::MissingFields(r) => assert_eq!(r.required_fields, vec!["recipientEmail"]),
        other => panic!("expected missing_fields, got {:?}", other),
    }

    let second = t
        .engine
        .process(
            TurnRequest::new("here you go")
                .in_conversation("c3")
                .with_data(object(json!({"recipientEmail": "x@y.com"}))),
            "tok",
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        second.to_value(),
        json!({"sent": true, "conversation_id": "c3"})
    );
    assert_eq!(t.classifier.calls(), vec!["invoice please".to_string()]);
}

#[tokio::test]
async fn test_dealer_report_dispatches_immediately() {
    let classifier = ScriptedClassifier::new().on(
        "What is my total bill?",
        json!({"category": "dealer", "intent": "get_total_bill", "data": null}),
    );
    let t = engine_with(
        classifier,
        vec![RecordingHandler::new(Category::Dealer, json!({"total": 1250}))],
        DialogueConfig::default(),
    );

    let response = t
        .engine
        .process(
            TurnRequest::new("What is my total bill?").in_conversation("d1"),
            "tok",
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        response.to_value(),
        json!({"total": 1250, "conversation_id": "d1"})
    );
    assert_eq!(t.handlers[0].calls().len(), 1);
    assert_eq!(t.handlers[0].calls()[0].0, "get_total_bill");
}

#[tokio::test]
async fn test_dispatched_intent_is_not_revived() {
    let classifier = ScriptedClassifier::new().on(
        "Create customer Bob",
        create_customer(json!({"name": "Bob", "email": "b@x.com", "phone": "1"})),
    );
    let t = engine_with(
        classifier,
        vec![RecordingHandler::new(Category::Customer, json!({}))],
        DialogueConfig::default(),
    );

    t.engine
        .process(TurnRequest::new("Create customer Bob").in_conversation("c4"), "tok", None)
        .await
        .unwrap();

    // "yes" has no scripted reply; with no open intent it must be classified.
    let after = t
        .engine
        .process(TurnRequest::new("yes").in_conversation("c4"), "tok", None)
        .await;
    assert!(after.is_err());
    assert_eq!(t.handlers[0].calls().len(), 1);
}

#[tokio::test]
async fn test_malformed_history_is_tolerated() {
    let classifier = ScriptedClassifier::new().on(
        "weekly sales",
        json!({"category": "dealer", "intent": "get_weekly_sale", "data": {}}),
    );
    let t = engine_with(
        classifier,
        vec![RecordingHandler::new(Category::Dealer, json!({"weekly": 7}))],
        DialogueConfig::default(),
    );

    let broken = TurnMetadata {
        status: Some("missing_fields".to_string()),
        stored_intent: Some(json!("not an envelope")),
        suggested_data: None,
        missing_fields: Some(vec!["name".to_string()]),
    };
    t.storage
        .append("c5", Role::Assistant, "plain text, not JSON", Some(&broken), None)
        .unwrap();
    t.storage
        .append("c5", Role::Assistant, "{not json either", None, None)
        .unwrap();

    let response = t
        .engine
        .process(TurnRequest::new("weekly sales").in_conversation("c5"), "tok", None)
        .await
        .unwrap();

    assert_eq!(response.status(), "dispatched");
    assert_eq!(t.handlers[0].calls().len(), 1);
}
