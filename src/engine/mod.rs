pub mod engine;
pub mod protocol;
pub mod apply_event;

pub mod sanitizer;
pub mod lexer;
pub mod router;
pub mod narrative_parser;
pub mod merge;
pub mod calendar;

pub mod prompt_builder;
pub mod llm_client;
pub mod encyclopedia;
