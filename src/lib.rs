//! Response parsing and state reconciliation for an AI-narrated roleplaying game.
//!
//! A model reply is split into narration and `[TAG: key=value]` directives,
//! the directives are typed and then applied to an immutable game snapshot.

pub mod engine;
pub mod model;
pub mod settings;
pub mod settings_io;

pub use engine::apply_event::{apply_directives, BatchKind};
pub use engine::narrative_parser::{parse_response, ParsedResponse};
pub use model::directive::{Directive, DirectiveKind, RawDirective};
pub use model::event_result::{ApplyOutcome, ApplyReport};
pub use model::game_state::GameStateSnapshot;
