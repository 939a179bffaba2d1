//! Fixed reply texts.

use crate::intent::{Entities, Intent};

pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that. Could you please rephrase?";
pub const CONFIRMED: &str = "Confirmed. Processing your request now...";
pub const CANCELLED: &str = "Action cancelled. How else can I help you?";
pub const YES_OR_NO: &str = "Please reply with 'yes' or 'no' to confirm or cancel.";

/// Question asked when `field` is the next missing value.
pub fn field_prompt(field: &str) -> String {
    let fixed = match field {
        "token1" => "Please tell me the first token symbol (e.g., APT).",
        "token2" => "Please tell me the second token symbol (e.g., USDC).",
        "apy" => "What APY percentage would you like to set for the pool?",
        "token_name" => "What is the name of the token you want to create?",
        "supply" => "What is the total supply for this token?",
        "pool_id" => "Which pool ID would you like to join?",
        "entity_type" => "Are you asking about a token or a pool?",
        "entity_id" => "Which token or pool should I look up?",
        other => return format!("Please provide {other}."),
    };
    fixed.to_string()
}

/// Summary of the pending action followed by a yes/no question.
pub fn confirmation_text(intent: Intent, entities: &Entities) -> String {
    let v = |field: &str| entities.get(field).unwrap_or_default();
    match intent {
        Intent::CreatePool => format!(
            "Creating liquidity pool for {} and {} with {}% APY. Confirm? (yes/no)",
            v("token1"),
            v("token2"),
            v("apy")
        ),
        Intent::CreateToken => format!(
            "Creating token named {} with supply {}. Confirm? (yes/no)",
            v("token_name"),
            v("supply")
        ),
        Intent::JoinPool => format!("Joining pool with ID {}. Confirm? (yes/no)", v("pool_id")),
        Intent::QueryInfo => format!(
            "Querying info for {}: {}. Confirm? (yes/no)",
            v("entity_type"),
            v("entity_id")
        ),
        Intent::GeneralHelp => "Welcome to the Aptos Assistant DeFi Suite! I can create liquidity pools, \
             create tokens, join pools and look up pool or token info. \
             Would you like a walkthrough of the DeFi basics? (yes/no)"
            .to_string(),
    }
}
