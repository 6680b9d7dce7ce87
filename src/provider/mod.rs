// src/provider/mod.rs — Generation API layer
//
// The provider supplies titles, page text, and illustrations, plus the
// token counts its API reports. Cost in USD is derived here from those
// counts; the analytics tracker records costs but never computes them.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::infra::errors::Result;

/// Token counts reported by the generation API for one call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug, Clone)]
pub struct TitleRequest {
    pub prompt: String,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct TitleBatch {
    pub titles: Vec<String>,
    pub model: String,
    pub usage: TokenUsage,
    pub cost_usd: f64,
}

#[derive(Debug, Clone)]
pub struct TextRequest {
    pub prompt: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryPage {
    pub page_num: u32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct StoryPages {
    pub pages: Vec<StoryPage>,
    pub model: String,
    pub usage: TokenUsage,
    pub cost_usd: f64,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub url: String,
    pub model: String,
    pub cost_usd: f64,
}

/// Seam between the API handlers and the remote generation service.
#[async_trait]
pub trait StoryProvider: Send + Sync {
    async fn generate_titles(&self, request: &TitleRequest) -> Result<TitleBatch>;
    async fn generate_text(&self, request: &TextRequest) -> Result<StoryPages>;
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage>;
}

/// Returns (input_price_per_mtok, output_price_per_mtok) for the text
/// models this app calls.
pub fn model_pricing(model: &str) -> (f64, f64) {
    match model {
        m if m.contains("gpt-4o-mini") => (0.15, 0.6),
        m if m.contains("gpt-4o") => (2.5, 10.0),
        m if m.contains("gpt-4.1-mini") => (0.4, 1.6),
        m if m.contains("gpt-4.1") => (2.0, 8.0),
        // Default: assume moderate pricing
        _ => (1.0, 3.0),
    }
}

/// USD cost of one text call.
pub fn calculate_cost(model: &str, usage: &TokenUsage) -> f64 {
    let (input_price, output_price) = model_pricing(model);
    let input_cost = (usage.input_tokens as f64 / 1_000_000.0) * input_price;
    let output_cost = (usage.output_tokens as f64 / 1_000_000.0) * output_price;
    input_cost + output_cost
}

/// USD cost of one generated image. Image models bill per image, not per
/// token; size defaults to 1024x1024.
pub fn image_cost(model: &str, size: Option<&str>) -> f64 {
    let size = size.unwrap_or("1024x1024");
    match (model, size) {
        (m, "1024x1024") if m.contains("dall-e-3") => 0.04,
        (m, _) if m.contains("dall-e-3") => 0.08,
        (m, _) if m.contains("dall-e-2") => 0.02,
        _ => 0.04,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_known_models() {
        assert_eq!(model_pricing("gpt-4o-mini"), (0.15, 0.6));
        assert_eq!(model_pricing("gpt-4o"), (2.5, 10.0));
        assert_eq!(model_pricing("gpt-4.1-mini"), (0.4, 1.6));
    }

    #[test]
    fn test_pricing_unknown_defaults() {
        assert_eq!(model_pricing("some-unknown-model"), (1.0, 3.0));
    }

    #[test]
    fn test_calculate_cost_basic() {
        let usage = TokenUsage {
            input_tokens: 1_000_000,
            output_tokens: 500_000,
        };
        let cost = calculate_cost("gpt-4o", &usage);
        // 1M input × $2.50/Mtok + 500K output × $10/Mtok = $2.50 + $5.00
        assert!((cost - 7.50).abs() < 0.001);
    }

    #[test]
    fn test_calculate_cost_zero_usage() {
        assert_eq!(calculate_cost("gpt-4o-mini", &TokenUsage::default()), 0.0);
    }

    #[test]
    fn test_image_cost_by_size() {
        assert_eq!(image_cost("dall-e-3", None), 0.04);
        assert_eq!(image_cost("dall-e-3", Some("1792x1024")), 0.08);
        assert_eq!(image_cost("dall-e-2", Some("1024x1024")), 0.02);
    }
}
