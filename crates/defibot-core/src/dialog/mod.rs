//! Dialog manager: the multi-turn state machine.
//!
//! A conversation moves through three phases:
//!
//! 1. **Idle** — the next message is classified by the intent recognizer
//! 2. **Collecting** — one required field is awaited; the raw reply fills it
//! 3. **AwaitingConfirmation** — everything is known, waiting for yes/no
//!
//! State lives in an explicit [`DialogState`] owned by the caller (usually a
//! [`Session`](crate::session::Session)), so one manager can drive any
//! number of independent conversations. Every [`Turn`] reports the phase it
//! left the conversation in.

pub mod prompts;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::intent::{Entities, Intent};
use crate::recognizer::IntentRecognizer;

/// Per-conversation dialog state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogState {
    pub current_intent: Option<Intent>,
    #[serde(default)]
    pub collected: Entities,
    pub waiting_for: Option<String>,
}

impl DialogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DialogPhase {
        match (&self.current_intent, &self.waiting_for) {
            (None, _) => DialogPhase::Idle,
            (Some(_), Some(field)) => DialogPhase::Collecting {
                field: field.clone(),
            },
            (Some(_), None) => DialogPhase::AwaitingConfirmation,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Point `waiting_for` at the next missing field of the current intent.
    /// Returns `true` when nothing is missing.
    fn advance(&mut self, intent: Intent) -> bool {
        self.waiting_for = intent.first_missing(&self.collected).map(str::to_string);
        self.waiting_for.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DialogPhase {
    Idle,
    Collecting { field: String },
    AwaitingConfirmation,
}

impl std::fmt::Display for DialogPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogPhase::Idle => f.write_str("idle"),
            DialogPhase::Collecting { field } => write!(f, "collecting {field}"),
            DialogPhase::AwaitingConfirmation => f.write_str("awaiting confirmation"),
        }
    }
}

/// An action the user said yes to. Executing it is the caller's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmedAction {
    pub intent: Intent,
    pub entities: Entities,
}

/// Outcome of one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub reply: String,
    pub phase: DialogPhase,
    pub confirmed: Option<ConfirmedAction>,
}

impl Turn {
    fn new(reply: impl Into<String>, state: &DialogState) -> Self {
        Self {
            reply: reply.into(),
            phase: state.phase(),
            confirmed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationReply {
    Affirmative,
    Negative,
    Unrecognized,
}

impl ConfirmationReply {
    pub fn classify(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "yes" | "y" | "confirm" | "sure" => Self::Affirmative,
            "no" | "n" | "cancel" => Self::Negative,
            _ => Self::Unrecognized,
        }
    }
}

pub struct DialogManager {
    recognizer: Box<dyn IntentRecognizer>,
}

impl DialogManager {
    pub fn new(recognizer: Box<dyn IntentRecognizer>) -> Self {
        Self { recognizer }
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Process one user message against `state`.
    pub async fn handle(&self, state: &mut DialogState, input: &str) -> Turn {
        match (state.current_intent, state.waiting_for.clone()) {
            (None, _) => self.start(state, input).await,
            (Some(intent), Some(field)) => Self::collect(state, intent, &field, input),
            (Some(intent), None) => Self::confirm(state, intent, input),
        }
    }

    async fn start(&self, state: &mut DialogState, input: &str) -> Turn {
        let recognition = self.recognizer.recognize(input).await;
        let Some(intent) = recognition.intent else {
            debug!(recognizer = self.recognizer.name(), "No intent, staying idle");
            return Turn::new(prompts::NOT_UNDERSTOOD, state);
        };

        state.current_intent = Some(intent);
        state.collected = recognition.entities.restricted_to(intent);
        info!(%intent, collected = state.collected.len(), "Intent recognized");
        Self::ask_or_confirm(state, intent)
    }

    fn collect(state: &mut DialogState, intent: Intent, field: &str, input: &str) -> Turn {
        state.collected.set(field, Some(input.trim().to_string()));
        debug!(%intent, field, "Collected field");
        Self::ask_or_confirm(state, intent)
    }

    fn ask_or_confirm(state: &mut DialogState, intent: Intent) -> Turn {
        if state.advance(intent) {
            info!(%intent, "All fields collected, awaiting confirmation");
            let reply = prompts::confirmation_text(intent, &state.collected);
            return Turn::new(reply, state);
        }
        let field = state.waiting_for.as_deref().unwrap_or_default();
        Turn::new(prompts::field_prompt(field), state)
    }

    fn confirm(state: &mut DialogState, intent: Intent, input: &str) -> Turn {
        match ConfirmationReply::classify(input) {
            ConfirmationReply::Affirmative => {
                let action = ConfirmedAction {
                    intent,
                    entities: std::mem::take(&mut state.collected),
                };
                state.reset();
                info!(%intent, "Action confirmed");
                let mut turn = Turn::new(prompts::CONFIRMED, state);
                turn.confirmed = Some(action);
                turn
            }
            ConfirmationReply::Negative => {
                state.reset();
                info!(%intent, "Action cancelled");
                Turn::new(prompts::CANCELLED, state)
            }
            ConfirmationReply::Unrecognized => Turn::new(prompts::YES_OR_NO, state),
        }
    }
}
