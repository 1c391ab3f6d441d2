// OKR engine: weighted progress, derived status, manager reviews, AI insights
// and period rollover. Handlers stay thin; rules live in models/progress/status.

pub mod archive;
pub mod handlers;
pub mod insights;
pub mod models;
pub mod progress;
pub mod prompts;
pub mod repository;
pub mod service;
pub mod status;

#[cfg(test)]
pub mod memory;
