pub mod action_parser;
pub mod decision;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod types;
