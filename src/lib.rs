// src/lib.rs — Library root for Storymill

pub mod analytics;
pub mod api;
pub mod cli;
pub mod infra;
pub mod provider;
pub mod store;
