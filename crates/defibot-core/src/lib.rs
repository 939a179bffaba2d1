//! defibot-core: Core library for the defibot DeFi assistant.
//!
//! Maps free-text messages to a fixed set of DeFi actions, asks for any
//! missing parameters, and requires an explicit yes before an action is
//! handed back as ready to execute:
//!
//! - [`intent`] — The intent enumeration, entities and recognition results
//! - [`extract`] — Regex entity extraction
//! - [`recognizer`] — Local (table + keywords) and remote (LLM) recognizers
//! - [`provider`] — LLM provider trait and OpenAI-compatible implementation
//! - [`dialog`] — The multi-turn dialog state machine
//! - [`session`] — Keyed sessions persisted as JSONL
//! - [`config`] — Typed configuration loading from JSON and the environment
//!
//! # Quick Start
//!
//! ```no_run
//! use defibot_core::dialog::{DialogManager, DialogState};
//! use defibot_core::recognizer::LocalRecognizer;
//!
//! # async fn example() {
//! let manager = DialogManager::new(Box::new(LocalRecognizer::new()));
//! let mut state = DialogState::new();
//!
//! let turn = manager.handle(&mut state, "Join pool 12345").await;
//! println!("{}", turn.reply); // Joining pool with ID 12345. Confirm? (yes/no)
//!
//! let turn = manager.handle(&mut state, "yes").await;
//! assert!(turn.confirmed.is_some());
//! # }
//! ```

pub mod config;
pub mod dialog;
pub mod extract;
pub mod intent;
pub mod provider;
pub mod recognizer;
pub mod session;
