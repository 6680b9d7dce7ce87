// src/provider/openai.rs — OpenAI-compatible generation client

use async_trait::async_trait;

use super::{
    calculate_cost, image_cost, GeneratedImage, ImageRequest, StoryPage, StoryPages, StoryProvider,
    TextRequest, TitleBatch, TitleRequest, TokenUsage,
};
use crate::infra::errors::{Result, StorymillError};

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl OpenAiProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            text_model: text_model.into(),
            image_model: image_model.into(),
        }
    }

    /// One chat call with a single retry on transient upstream failures.
    async fn chat(&self, system: &str, prompt: &str) -> Result<(String, TokenUsage)> {
        match self.chat_once(system, prompt).await {
            Err(e) if e.is_retriable() => {
                tracing::warn!(error = %e, "chat call failed, retrying once");
                self.chat_once(system, prompt).await
            }
            other => other,
        }
    }

    async fn chat_once(&self, system: &str, prompt: &str) -> Result<(String, TokenUsage)> {
        let body = serde_json::json!({
            "model": self.text_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(StorymillError::Provider {
                message: format!("HTTP {status}: {error_body}"),
                status: Some(status.as_u16()),
            });
        }

        let resp: serde_json::Value = response.json().await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        if content.is_empty() {
            return Err(StorymillError::ProviderResponse(
                "empty completion content".into(),
            ));
        }
        let usage = TokenUsage {
            input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };
        Ok((content, usage))
    }
}

#[async_trait]
impl StoryProvider for OpenAiProvider {
    async fn generate_titles(&self, request: &TitleRequest) -> Result<TitleBatch> {
        let system = format!(
            "You write titles for illustrated children's stories. \
             Reply with exactly {} titles, one per line, no numbering.",
            request.count
        );
        let (content, usage) = self.chat(&system, &request.prompt).await?;
        let titles = parse_titles(&content, request.count);
        if titles.is_empty() {
            return Err(StorymillError::ProviderResponse(
                "no titles in completion".into(),
            ));
        }
        Ok(TitleBatch {
            titles,
            model: self.text_model.clone(),
            usage,
            cost_usd: calculate_cost(&self.text_model, &usage),
        })
    }

    async fn generate_text(&self, request: &TextRequest) -> Result<StoryPages> {
        let system = format!(
            "You write illustrated children's stories. Reply with exactly {} \
             pages separated by a line containing only '---'.",
            request.page_count
        );
        let (content, usage) = self.chat(&system, &request.prompt).await?;
        let pages = parse_pages(&content);
        if pages.is_empty() {
            return Err(StorymillError::ProviderResponse(
                "no pages in completion".into(),
            ));
        }
        Ok(StoryPages {
            pages,
            model: self.text_model.clone(),
            usage,
            cost_usd: calculate_cost(&self.text_model, &usage),
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage> {
        let size = request.size.as_deref().unwrap_or("1024x1024");
        let body = serde_json::json!({
            "model": self.image_model,
            "prompt": request.prompt,
            "n": 1,
            "size": size,
        });

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(StorymillError::Provider {
                message: format!("HTTP {status}: {error_body}"),
                status: Some(status.as_u16()),
            });
        }

        let resp: serde_json::Value = response.json().await?;
        let url = resp["data"][0]["url"].as_str().unwrap_or("").to_string();
        if url.is_empty() {
            return Err(StorymillError::ProviderResponse(
                "no image url in response".into(),
            ));
        }
        Ok(GeneratedImage {
            url,
            model: self.image_model.clone(),
            cost_usd: image_cost(&self.image_model, Some(size)),
        })
    }
}

fn parse_titles(content: &str, max: u32) -> Vec<String> {
    content
        .lines()
        .map(|l| l.trim().trim_start_matches(['-', '*', ' ']).trim())
        .filter(|l| !l.is_empty())
        .take(max as usize)
        .map(str::to_string)
        .collect()
}

fn parse_pages(content: &str) -> Vec<StoryPage> {
    content
        .split("\n---\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, text)| StoryPage {
            page_num: i as u32 + 1,
            text: text.to_string(),
        })
        .collect()
}
