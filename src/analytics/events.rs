// src/analytics/events.rs — Event names and payload shaping
//
// Event name strings are load-bearing: downstream dashboards key on them
// exactly as written here.

use serde::Serialize;
use serde_json::{Map, Value};

pub mod names {
    pub const STORY_CREATION_START: &str = "story_creation_start";
    pub const STORY_CREATION_COMPLETE: &str = "story_creation_complete";
    pub const STORY_CREATION_COST: &str = "story_creation_cost";
    pub const STORY_CREATION_ERROR: &str = "story_creation_error";
    pub const TITLE_GENERATION: &str = "title_generation";
    pub const CREATING_TEXT_START: &str = "creating_text_start";
    pub const CREATING_TEXT_FINISH: &str = "creating_text_finish";
    pub const CREATING_IMAGE_START: &str = "creating_image_start";
    pub const CREATING_IMAGE_FINISH: &str = "creating_image_finish";
    pub const IMAGE_GENERATION_ERROR: &str = "image_generation_error";
    pub const IMAGE_REGENERATION: &str = "image_regeneration";
    pub const READING_STORY_START: &str = "reading_story_start";
    pub const READING_STORY_FINISH: &str = "reading_story_finish";
    pub const STORY_PAGE_VIEW: &str = "story_page_view";
    pub const READING_STORY_SELECTED_PATH: &str = "reading_story_selected_path";
    pub const OPENAI_COST: &str = "openai_cost";
    pub const API_PERFORMANCE: &str = "api_performance";
}

/// One analytics event: a name plus a flat string→primitive payload.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub name: &'static str,
    pub payload: Map<String, Value>,
}

impl AnalyticsEvent {
    /// Starts a payload carrying `timestamp` (ms since epoch), which every
    /// emitted event includes.
    pub fn new(name: &'static str, timestamp_ms: i64) -> Self {
        let mut payload = Map::new();
        payload.insert("timestamp".into(), timestamp_ms.into());
        Self { name, payload }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Inserts the field only when the value is present; absent optional
    /// fields are omitted from the payload entirely.
    pub fn field_opt(self, key: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    /// Adds the standard duration triple: `duration_ms`, `duration_seconds`
    /// (rounded), and `duration_minutes` (rounded) only past the one-minute
    /// mark. Negative inputs are clamped to zero.
    pub fn duration(mut self, duration_ms: i64) -> Self {
        let ms = duration_ms.max(0);
        self.payload.insert("duration_ms".into(), ms.into());
        let seconds = (ms as f64 / 1000.0).round() as i64;
        self.payload.insert("duration_seconds".into(), seconds.into());
        if ms > 60_000 {
            let minutes = (ms as f64 / 60_000.0).round() as i64;
            self.payload.insert("duration_minutes".into(), minutes.into());
        }
        self
    }

    /// Payload value lookup, mostly for assertions.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}
