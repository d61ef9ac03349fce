pub mod events;
pub mod onboarding;
pub mod tasks;
