// Protection module - moderation pipeline and its detectors.
// Each detector is its own file; the service composes them.

pub mod executor;
pub mod link_classifier;
pub mod mention_counter;
pub mod protection_models;
pub mod protection_service;
pub mod rate_window;
pub mod role_guard;
pub mod word_matcher;
