use crate::engine::encyclopedia::EncyclopediaData;
use crate::model::event_result::ApplyReport;
use crate::model::game_state::GameStateSnapshot;

pub enum EngineCommand {
    /// Runs the opening turn for the configured world.
    StartGame,
    PlayerAction(String),
    ImportEncyclopedia(EncyclopediaData),
    /// Has the model merge duplicates and drop junk from the encyclopedia.
    OptimizeEncyclopedia,
    Shutdown,
}

#[derive(Debug)]
pub enum EngineResponse {
    TurnApplied {
        narration: String,
        report: ApplyReport,
        state: Box<GameStateSnapshot>,
    },

    EncyclopediaImported {
        state: Box<GameStateSnapshot>,
    },

    EncyclopediaOptimized {
        state: Box<GameStateSnapshot>,
    },

    Error(String),
}
