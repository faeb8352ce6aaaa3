use dreamai::{
    ai::{InterpretationService, MockInterpretationClient, OpenAiInterpretationClient},
    app::{App, AppServices},
    entitlement::StaticEntitlement,
    models::{DreamRequest, Interpretation},
    state::{ContentState, InterpretationSession},
    store::{DreamStore, JsonFileStore, MemoryStore},
    Error,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn interpretation_payload(score: f64) -> serde_json::Value {
    serde_json::json!({
        "dreamTitle": "Above the City Lights",
        "dreamSummary": "You soar over a glowing city at night.",
        "fullInterpretation": "Flying dreams often mirror a longing for freedom or perspective.",
        "moodInsights": [
            { "emoji": "🕊️", "label": "Freedom", "score": score },
            { "emoji": "😮", "label": "Wonder", "score": -0.3 }
        ],
        "symbolism": [
            { "icon": "🏙️", "meaning": "The structures of your daily life." }
        ],
        "reflectionPrompts": ["What would you do with more freedom?"],
        "quote": { "text": "I dream of painting and then I paint my dream.", "author": "Vincent van Gogh" },
        "tags": ["Flying", "City"]
    })
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn openai_client(server: &MockServer) -> OpenAiInterpretationClient {
    OpenAiInterpretationClient::new("test-key".to_string(), "gpt-4o-mini".to_string())
        .with_base_url(server.uri())
}

#[tokio::test]
async fn test_flying_dream_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(&interpretation_payload(1.7).to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let interpretation = openai_client(&server)
        .interpret(&DreamRequest::new("I was flying over a city"))
        .await
        .unwrap();

    assert!(!interpretation.dream_title.is_empty());
    assert!(!interpretation.full_interpretation.is_empty());
    assert!(!interpretation.mood_insights.is_empty());
    assert_eq!(interpretation.mood_insights[0].score(), 1.0);
    assert_eq!(interpretation.mood_insights[1].score(), 0.0);
}

#[tokio::test]
async fn test_whitespace_dream_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for text in ["", "   ", "\n\t "] {
        let err = openai_client(&server)
            .interpret(&DreamRequest::new(text))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_sets_error_state_and_retry_sends_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failure"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAT_COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(&interpretation_payload(0.6).to_string())),
        )
        .mount(&server)
        .await;

    let session = InterpretationSession::new(
        Arc::new(openai_client(&server)),
        DreamRequest::new("Running through an endless hallway"),
    );

    let err = session.run().await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
    assert!(matches!(session.state(), ContentState::Error(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    session.retry().await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert!(matches!(session.state(), ContentState::Success(_)));
}

#[tokio::test]
async fn test_empty_choices_is_decoding_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = openai_client(&server)
        .interpret(&DreamRequest::new("A house with too many doors"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decoding(_)));
}

#[tokio::test]
async fn test_partial_interpretation_is_rejected_whole() {
    let server = MockServer::start().await;
    let mut payload = interpretation_payload(0.5);
    payload.as_object_mut().unwrap().remove("reflectionPrompts");

    Mock::given(method("POST"))
        .and(path(CHAT_COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&payload.to_string())))
        .mount(&server)
        .await;

    let err = openai_client(&server)
        .interpret(&DreamRequest::new("A house with too many doors"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decoding(_)));
}

#[tokio::test]
async fn test_journal_round_trip_through_json_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(&interpretation_payload(0.8).to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path()).unwrap());
    let mut app = App::with_services(AppServices {
        interpreter: Arc::new(openai_client(&server)),
        dreams: store.clone(),
        preferences: store.clone(),
        entitlement: Arc::new(StaticEntitlement::new(true)),
    })
    .unwrap();

    let calm = app.moods().find("Calm").cloned().unwrap();
    let dream = app
        .record_dream("I was flying over a city", Some(calm), ["Flying"])
        .unwrap();
    let saved = app.interpret_dream(dream.id).await.unwrap();
    drop(app);

    let reopened = JsonFileStore::open(dir.path()).unwrap();
    let loaded: Interpretation = reopened.interpretation_for(dream.id).unwrap().unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.dream_parent_id, Some(dream.id));
    assert_eq!(reopened.dream(dream.id).unwrap().unwrap().mood.unwrap().title, "Calm");
}

#[tokio::test]
async fn test_each_dream_interpreted_independently() {
    let mock = MockInterpretationClient::new();
    let store = MemoryStore::new();
    let mut app = App::with_services(AppServices {
        interpreter: Arc::new(mock.clone()),
        dreams: Arc::new(store.clone()),
        preferences: Arc::new(store.clone()),
        entitlement: Arc::new(StaticEntitlement::new(true)),
    })
    .unwrap();

    let first = app.record_dream("A maze of mirrors", None, ["Lucid"]).unwrap();
    let second = app.record_dream("A storm at sea", None, ["Water"]).unwrap();

    let (a, b) = tokio::join!(app.interpret_dream(first.id), app.interpret_dream(second.id));

    assert_eq!(a.unwrap().dream_parent_id, Some(first.id));
    assert_eq!(b.unwrap().dream_parent_id, Some(second.id));
    assert_eq!(mock.get_call_count(), 2);
    assert_eq!(store.snapshot().interpretations.len(), 2);
}
