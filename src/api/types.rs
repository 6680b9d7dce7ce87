// src/api/types.rs

use serde::{Deserialize, Serialize};

use crate::provider::StoryPage;

fn default_title_count() -> u32 {
    3
}

fn default_page_count() -> u32 {
    8
}

/// Request body for title generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTitlesRequest {
    pub user_id: String,
    pub kid_id: String,
    pub prompt: String,
    #[serde(default = "default_title_count")]
    pub count: u32,
    /// Present on the first call of a creation flow; opens the session.
    #[serde(default)]
    pub problem_description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateTitlesResponse {
    pub titles: Vec<String>,
    pub cost_usd: f64,
}

/// Request body for story text generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTextRequest {
    pub user_id: String,
    pub kid_id: String,
    pub prompt: String,
    #[serde(default = "default_page_count")]
    pub page_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateTextResponse {
    pub pages: Vec<StoryPage>,
    pub cost_usd: f64,
}

/// Request body for illustration generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    pub user_id: String,
    pub story_id: String,
    pub page_type: String,
    pub prompt: String,
    #[serde(default)]
    pub size: Option<String>,
    /// When set, the image cost is folded into this kid's creation session.
    #[serde(default)]
    pub kid_id: Option<String>,
    #[serde(default)]
    pub is_regeneration: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    pub url: String,
    pub cost_usd: f64,
}

/// Request body for marking a creation flow done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteStoryRequest {
    pub user_id: String,
    pub kid_id: String,
    /// Omitted when the client lets the server mint the story id.
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub story_title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteStoryResponse {
    pub story_id: String,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
