//! Whole conversations through recognizer, turn handler and the cafe dialogs.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cafebot_config::{CafeConfig, default_routes};
use cafebot_core::store::{self, StateKey};
use cafebot_core::{
    ALREADY_SHOWING_CAPABILITIES, Channel, ConversationRef, DispatchError, Dispatcher,
    StateStore, TurnHandler, TurnResult, TurnStatus,
};
use cafebot_dialogs::{ReservationState, UserProfile};
use cafebot_nlu::PatternRecognizer;
use cafebot_store::MemoryStateStore;

#[derive(Default)]
struct Transcript {
    lines: Mutex<Vec<(String, Vec<String>)>>,
}

impl Transcript {
    fn take(&self) -> Vec<(String, Vec<String>)> {
        self.lines
            .lock()
            .map(|mut lines| std::mem::take(&mut *lines))
            .unwrap_or_default()
    }

    fn take_texts(&self) -> Vec<String> {
        self.take().into_iter().map(|(text, _)| text).collect()
    }
}

#[async_trait]
impl Channel for Transcript {
    async fn send(&self, conversation: &ConversationRef, text: &str) -> anyhow::Result<()> {
        self.send_with_suggestions(conversation, text, &[]).await
    }

    async fn send_with_suggestions(
        &self,
        _conversation: &ConversationRef,
        text: &str,
        suggestions: &[String],
    ) -> anyhow::Result<()> {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((text.to_string(), suggestions.to_vec()));
        }
        Ok(())
    }
}

struct Cafe {
    handler: TurnHandler,
    recognizer: PatternRecognizer,
    store: Arc<MemoryStateStore>,
    transcript: Arc<Transcript>,
    conversation: ConversationRef,
}

impl Cafe {
    fn open() -> Self {
        let cafe = CafeConfig::default();
        let dispatcher = Dispatcher::builder()
            .registry(cafebot_dialogs::registry(&cafe).expect("dialogs should register"))
            .routes(default_routes())
            .build()
            .expect("dispatcher should build");

        let store = Arc::new(MemoryStateStore::new());
        let transcript = Arc::new(Transcript::default());
        let handler = TurnHandler::builder()
            .dispatcher(Arc::new(dispatcher))
            .store(store.clone())
            .channel(transcript.clone())
            .build()
            .expect("handler should build");

        Self {
            handler,
            recognizer: PatternRecognizer::with_locations(&cafe.locations)
                .expect("recognizer should build"),
            store,
            transcript,
            conversation: ConversationRef::new("chat-1", "user-1"),
        }
    }

    async fn try_say(&self, text: &str) -> Result<TurnResult, DispatchError> {
        let input = self.recognizer.recognize_text(text);
        self.handler.handle_turn(&self.conversation, input).await
    }

    async fn say(&self, text: &str) -> TurnResult {
        self.try_say(text).await.expect("turn should succeed")
    }

    async fn active(&self) -> Vec<String> {
        self.handler
            .load_stack(&self.conversation)
            .await
            .expect("stack should load")
            .unwrap_or_default()
            .frames()
            .iter()
            .map(|f| f.dialog_id.clone())
            .collect()
    }
}

#[tokio::test]
async fn booking_collects_missing_details() {
    let cafe = Cafe::open();

    let result = cafe.say("Book a table for 2 in Seattle").await;
    assert_eq!(result.status, TurnStatus::Waiting);
    assert_eq!(
        cafe.transcript.take_texts(),
        vec!["What day would you like to come in?"]
    );

    cafe.say("tomorrow").await;
    assert_eq!(
        cafe.transcript.take_texts(),
        vec!["What time should I book the table for?"]
    );

    let result = cafe.say("7pm").await;
    assert!(result.is_complete());

    let lines = cafe.transcript.take();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0].0,
        "Great, I've booked a table for 2 at our Seattle cafe tomorrow at 19:00."
    );
    assert_eq!(lines[1].0, "Is there anything else I can help you with?");
    assert_eq!(lines[1].1.len(), 3);
    assert!(cafe.active().await.is_empty());

    let saved: Option<ReservationState> =
        store::load(cafe.store.as_ref(), &StateKey::Reservation("user-1").to_string())
            .await
            .expect("reservation should load");
    let saved = saved.expect("reservation should be saved");
    assert_eq!(saved.location.as_deref(), Some("Seattle"));
    assert_eq!(saved.party_size, Some(2));
}

#[tokio::test]
async fn capabilities_interrupt_and_cancel_unwinds() {
    let cafe = Cafe::open();

    cafe.say("Book a table").await;
    let lines = cafe.transcript.take();
    assert_eq!(lines[0].0, "Which of our locations would you like to book at?");
    assert_eq!(lines[0].1, CafeConfig::default().locations);

    cafe.say("What can you do?").await;
    assert_eq!(cafe.active().await, vec!["BookTable", "ShowCapabilities"]);
    cafe.transcript.take();

    let denied = cafe.say("What can you do?").await;
    assert_eq!(denied.status, TurnStatus::Empty);
    assert_eq!(
        cafe.transcript.take_texts(),
        vec![ALREADY_SHOWING_CAPABILITIES]
    );
    assert_eq!(cafe.active().await, vec!["BookTable", "ShowCapabilities"]);

    let cancelled = cafe.say("cancel").await;
    assert_eq!(cancelled.status, TurnStatus::Cancelled);
    assert!(cafe.active().await.is_empty());
    assert_eq!(cafe.transcript.take_texts().len(), 1);
}

#[tokio::test]
async fn tapped_suggestion_answers_the_open_question() {
    let cafe = Cafe::open();

    cafe.say("Book a table").await;
    cafe.transcript.take();

    let result = cafe.say(r#"{"text":"Renton"}"#).await;
    assert_eq!(result.status, TurnStatus::Waiting);
    assert_eq!(
        cafe.transcript.take_texts(),
        vec!["What day would you like to come in?"]
    );
    assert_eq!(cafe.active().await, vec!["BookTable"]);
}

#[tokio::test]
async fn tapped_suggestion_starts_a_dialog_when_idle() {
    let cafe = Cafe::open();

    let result = cafe.say(r#"{"text":"What are your hours?"}"#).await;
    assert!(result.is_complete());

    let texts = cafe.transcript.take_texts();
    assert_eq!(texts[0], "You said: 'What are your hours?'.");
    assert!(texts[1].starts_with("We are open"));
    assert_eq!(texts.len(), 3);
}

#[tokio::test]
async fn broken_suggestion_asks_for_a_choice() {
    let cafe = Cafe::open();

    cafe.say("Book a table").await;
    cafe.transcript.take();

    let result = cafe.say(r#"{"text": 42}"#).await;
    assert_eq!(result.status, TurnStatus::Empty);
    assert_eq!(
        cafe.transcript.take_texts(),
        vec![cafebot_core::CHOOSE_AN_OPTION]
    );
    assert_eq!(cafe.active().await, vec!["BookTable"]);
}

#[tokio::test]
async fn profile_is_remembered() {
    let cafe = Cafe::open();

    cafe.say("Who are you?").await;
    assert_eq!(
        cafe.transcript.take_texts(),
        vec!["Hi, I'm the Contoso Cafe bot. What's your name?"]
    );

    let result = cafe.say("Ada").await;
    assert!(result.is_complete());
    assert_eq!(
        cafe.transcript.take_texts()[0],
        "Nice to meet you, Ada! I'm the Contoso Cafe bot."
    );

    cafe.say("hello").await;
    assert_eq!(
        cafe.transcript.take_texts()[0],
        "Hi Ada, welcome back to Contoso Cafe!"
    );

    let profile: Option<UserProfile> =
        store::load(cafe.store.as_ref(), &StateKey::UserProfile("user-1").to_string())
            .await
            .expect("profile should load");
    assert_eq!(profile.and_then(|p| p.name).as_deref(), Some("Ada"));
}

#[tokio::test]
async fn unknown_request_gets_fallback() {
    let cafe = Cafe::open();

    let result = cafe.say("sing me a song").await;
    assert_eq!(result.status, TurnStatus::Empty);
    assert_eq!(
        cafe.transcript.take_texts(),
        vec!["I'm still learning. Sorry, I don't know how to help you with that yet."]
    );
    assert!(cafe.active().await.is_empty());
}

#[tokio::test]
async fn capabilities_end_with_the_next_request() {
    let cafe = Cafe::open();

    cafe.say("What can you do?").await;
    assert_eq!(cafe.active().await, vec!["ShowCapabilities"]);

    let answered = cafe.say("What are your hours?").await;
    assert!(answered.is_complete());
    assert!(cafe.active().await.is_empty());
    cafe.transcript.take();

    let again = cafe.say("What can you do?").await;
    assert_eq!(again.status, TurnStatus::Waiting);
    let texts = cafe.transcript.take_texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Here's what I can do"));
    assert_eq!(cafe.active().await, vec!["ShowCapabilities"]);
}

#[tokio::test]
async fn repeated_interruptions_do_not_grow_the_stack() {
    let cafe = Cafe::open();

    for _ in 0..3 {
        cafe.say("Book a table").await;
        cafe.say("What can you do?").await;
    }

    assert_eq!(cafe.active().await, vec!["BookTable", "ShowCapabilities"]);
}

#[tokio::test]
async fn booking_resumes_after_a_question_is_answered() {
    let cafe = Cafe::open();

    cafe.say("Book a table").await;
    cafe.say("What can you do?").await;

    let answered = cafe.say("What are your hours?").await;
    assert!(answered.is_complete());
    assert_eq!(cafe.active().await, vec!["BookTable"]);

    // The prompt after the answer offers "What can you do?" again.
    let lines = cafe.transcript.take();
    let (_, suggestions) = lines.last().cloned().unwrap_or_default();
    assert!(suggestions.iter().any(|s| s == "What can you do?"));

    let tapped = cafe.say(r#"{"text":"What can you do?"}"#).await;
    assert_eq!(tapped.status, TurnStatus::Waiting);
    assert_eq!(cafe.active().await, vec!["BookTable", "ShowCapabilities"]);
    cafe.transcript.take();

    let resumed = cafe.say("Seattle").await;
    assert_eq!(resumed.status, TurnStatus::Waiting);
    assert_eq!(cafe.active().await, vec!["BookTable"]);
    assert_eq!(
        cafe.transcript.take_texts(),
        vec!["What day would you like to come in?"]
    );
}

#[tokio::test]
async fn unreadable_booking_state_fails_the_turn() {
    let cafe = Cafe::open();

    let stack = serde_json::json!([
        { "dialog_id": "BookTable", "state": { "partySize": "lots", "asking": "date" } }
    ]);
    cafe.store
        .set(&StateKey::DialogStack("chat-1").to_string(), stack)
        .await
        .expect("stack should be stored");

    let result = cafe.try_say("tomorrow").await;
    assert!(matches!(
        result,
        Err(DispatchError::Dialog { ref dialog_id, .. }) if dialog_id == "BookTable"
    ));
}
