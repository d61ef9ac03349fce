// src/core/onboarding/mod.rs
pub mod auth;
pub mod dedup;
pub mod orchestrator;
pub mod types;

pub use dedup::ActiveRequests;
pub use orchestrator::OnboardingService;
