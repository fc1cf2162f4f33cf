use serde::{Deserialize, Serialize};

/// One entry of the turn history fed back into prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum GameTurn {
    Action(String),
    Narration(String),
}

impl GameTurn {
    pub fn content(&self) -> &str {
        match self {
            GameTurn::Action(text) | GameTurn::Narration(text) => text,
        }
    }
}
