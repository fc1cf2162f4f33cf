use std::sync::mpsc::{Receiver, Sender};

use log::{debug, error, info};

use crate::engine::apply_event::{apply_directives, BatchKind};
use crate::engine::calendar::extract_time_passed;
use crate::engine::encyclopedia::{import_into, optimize, EncyclopediaData};
use crate::engine::llm_client::{CompletionService, KeyRing, LlmError};
use crate::engine::narrative_parser::parse_response;
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::directive::{Directive, DirectiveKind};
use crate::model::game_state::GameStateSnapshot;
use crate::model::message::GameTurn;
use crate::model::world::WorldSetup;

/// Owns the game state and talks to the model. Runs on its own thread;
/// the front end only sees commands and responses.
pub struct Engine {
    service: Box<dyn CompletionService + Send>,
    keys: KeyRing,
    world: WorldSetup,
    state: GameStateSnapshot,
    history: Vec<GameTurn>,
}

impl Engine {
    pub fn new(service: Box<dyn CompletionService + Send>, keys: KeyRing, world: WorldSetup) -> Self {
        Self {
            service,
            keys,
            world,
            state: GameStateSnapshot::default(),
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameStateSnapshot {
        &self.state
    }

    pub fn history(&self) -> &[GameTurn] {
        &self.history
    }

    pub fn run(&mut self, rx: Receiver<EngineCommand>, tx: Sender<EngineResponse>) {
        while let Ok(cmd) = rx.recv() {
            let Some(response) = self.handle(cmd) else {
                info!("Engine shutting down");
                break;
            };
            if tx.send(response).is_err() {
                break;
            }
        }
    }

    /// Processes one command. `None` means the engine should stop.
    pub fn handle(&mut self, cmd: EngineCommand) -> Option<EngineResponse> {
        let response = match cmd {
            EngineCommand::StartGame => self.start_game(),
            EngineCommand::PlayerAction(text) => self.player_action(&text),
            EngineCommand::ImportEncyclopedia(data) => Ok(self.import(&data)),
            EngineCommand::OptimizeEncyclopedia => self.optimize(),
            EngineCommand::Shutdown => return None,
        };

        Some(response.unwrap_or_else(|err| {
            error!("Turn failed: {err}");
            EngineResponse::Error(err.to_string())
        }))
    }

    fn start_game(&mut self) -> Result<EngineResponse, LlmError> {
        self.state = GameStateSnapshot::default();
        self.history.clear();

        let prompt = PromptBuilder::start_game(&self.world);
        self.run_turn(&prompt, BatchKind::StartGame)
    }

    fn player_action(&mut self, text: &str) -> Result<EngineResponse, LlmError> {
        let prompt = PromptBuilder::next_turn(&self.world, &self.state, &self.history, text);
        let response = self.run_turn(&prompt, BatchKind::NextTurn)?;
        // Recorded only once the model answered, before the narration.
        let at = self.history.len() - 1;
        self.history.insert(at, GameTurn::Action(text.to_string()));
        Ok(response)
    }

    fn import(&mut self, data: &EncyclopediaData) -> EngineResponse {
        self.state = import_into(&self.state, data);
        EngineResponse::EncyclopediaImported {
            state: Box::new(self.state.clone()),
        }
    }

    fn optimize(&mut self) -> Result<EngineResponse, LlmError> {
        self.state = optimize(self.service.as_ref(), &mut self.keys, &self.state)?;
        Ok(EngineResponse::EncyclopediaOptimized {
            state: Box::new(self.state.clone()),
        })
    }

    fn run_turn(&mut self, prompt: &str, batch: BatchKind) -> Result<EngineResponse, LlmError> {
        let system = PromptBuilder::system_instruction(&self.world);
        let raw = self
            .service
            .complete_text(&mut self.keys, prompt, Some(&system))?;

        let mut parsed = parse_response(&raw);

        // The model is told to always send TIME_PASSED; when it forgets,
        // read the elapsed time from the prose instead.
        let has_time = parsed
            .directives
            .iter()
            .any(|d| d.kind() == DirectiveKind::TimePassed);
        if batch == BatchKind::NextTurn && !has_time {
            let delta = extract_time_passed(&parsed.narration);
            if !delta.is_empty() {
                debug!("No TIME_PASSED tag; using {delta:?} from the narration");
                parsed.directives.push(Directive::TimePassed(delta));
            }
        }

        let (next, report) = apply_directives(&self.state, &parsed.directives, batch);
        self.state = next;
        self.history.push(GameTurn::Narration(parsed.narration.clone()));

        Ok(EngineResponse::TurnApplied {
            narration: parsed.narration,
            report,
            state: Box::new(self.state.clone()),
        })
    }
}
