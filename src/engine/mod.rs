pub mod engine;
pub mod protocol;
pub mod turn;
pub mod apply_narrative;

pub mod economy;
pub mod chance;
pub mod sanitizer;

pub mod prompt_builder;
pub mod llm_client;
pub mod generation;
pub mod narrative_parser;
