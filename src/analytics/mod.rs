// src/analytics/mod.rs

pub mod adapter;
pub mod events;
pub mod session;
pub mod sink;
pub mod tracker;

pub use sink::EventSink;
pub use tracker::AnalyticsTracker;
