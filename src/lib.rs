pub mod config;
pub mod error;
pub mod catalog;
pub mod metadata;
pub mod intent;
pub mod prompt;
pub mod llm;
pub mod cli;
