pub mod api;
pub mod app;
pub mod config;
pub mod evaluator;
pub mod logging;
pub mod state;
