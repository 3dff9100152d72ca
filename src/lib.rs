pub mod api;
pub mod app;
pub mod engine;
pub mod prompt;
