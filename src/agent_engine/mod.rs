pub mod action;
pub mod engine;
pub mod handle;
pub mod history;
pub mod loop_control;
pub mod state;
