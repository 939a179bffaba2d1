//! Intent recognition strategies.
//!
//! Both strategies sit behind [`IntentRecognizer`] so the dialog manager
//! never knows which one is active:
//!
//! - [`LocalRecognizer`] — example phrases, then keyword rules. No I/O.
//! - [`RemoteRecognizer`] — one chat completion that must answer in JSON.
//!
//! Recognition never fails outward; any problem yields
//! [`Recognition::none`](crate::intent::Recognition::none).

pub mod local;
pub mod remote;

use async_trait::async_trait;
use serde::Deserialize;

use crate::intent::Recognition;

pub use local::LocalRecognizer;
pub use remote::RemoteRecognizer;

/// Maps one user utterance to an intent and its entities.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    async fn recognize(&self, text: &str) -> Recognition;

    /// Short label for logs and status output.
    fn name(&self) -> &str;
}

/// Which recognizer the assistant runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Local,
    Remote,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Strategy::Local),
            "remote" | "llm" => Ok(Strategy::Remote),
            other => Err(format!("unknown recognizer strategy `{other}` (expected local or remote)")),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Local => f.write_str("local"),
            Strategy::Remote => f.write_str("remote"),
        }
    }
}
