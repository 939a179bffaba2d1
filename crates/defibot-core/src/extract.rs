//! Regex-based entity extraction.
//!
//! Best effort only: values are pulled out by pattern and never checked
//! for meaning (a matched symbol need not be a real asset).

use regex::Regex;
use std::sync::LazyLock;

use crate::intent::{Entities, Intent};

static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,5}\b").expect("symbol regex"));
static APY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").expect("apy regex"));
static TOKEN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)named (\w+)").expect("token name regex"));
static SUPPLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)supply of (\d+)").expect("supply regex"));
static POOL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)pool (\d+)").expect("pool id regex"));
static QUERY_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(token|pool)\s+(?:id\s+)?([A-Za-z0-9_]+)").expect("query target regex")
});

/// Extract the fields of `intent` from `text`. Unmatched fields are `None`.
pub fn extract(text: &str, intent: Intent) -> Entities {
    let mut entities = Entities::new();
    match intent {
        Intent::CreatePool => {
            let mut symbols = SYMBOL_RE.find_iter(text).map(|m| m.as_str().to_string());
            entities.set("token1", symbols.next());
            entities.set("token2", symbols.next());
            entities.set("apy", capture(&APY_RE, text, 1));
        }
        Intent::CreateToken => {
            entities.set("token_name", capture(&TOKEN_NAME_RE, text, 1));
            entities.set("supply", capture(&SUPPLY_RE, text, 1));
        }
        Intent::JoinPool => {
            entities.set("pool_id", capture(&POOL_ID_RE, text, 1));
        }
        Intent::QueryInfo => {
            let caps = QUERY_TARGET_RE.captures(text);
            entities.set(
                "entity_type",
                caps.as_ref()
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_lowercase()),
            );
            entities.set(
                "entity_id",
                caps.as_ref()
                    .and_then(|c| c.get(2))
                    .map(|m| m.as_str().to_string()),
            );
        }
        Intent::GeneralHelp => {}
    }
    entities
}

fn capture(re: &Regex, text: &str, group: usize) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str().to_string())
}
