pub mod calendar;
pub mod directive;
pub mod event_result;
pub mod game_state;
pub mod llm_decode;
pub mod message;
pub mod value;
pub mod world;
