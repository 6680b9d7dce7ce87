// src/api/handlers.rs
//
// Each handler is a thin proxy: call the provider, report the outcome to
// the tracker, return JSON. Tracker calls surround the provider call so a
// navigation away mid-generation still leaves a coherent event trail.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::types::*;
use crate::api::ApiState;
use crate::infra::errors::StorymillError;
use crate::provider::{ImageRequest, TextRequest, TitleRequest};
use crate::store::profiles::{KidProfile, UserProfile};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn provider_error(e: &StorymillError) -> ApiError {
    let status = match e {
        StorymillError::Provider { status: Some(s), .. }
            if *s == StatusCode::TOO_MANY_REQUESTS.as_u16() =>
        {
            StatusCode::TOO_MANY_REQUESTS
        }
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// POST /api/generate/titles
pub async fn generate_titles(
    State(state): State<ApiState>,
    Json(body): Json<GenerateTitlesRequest>,
) -> Result<Json<GenerateTitlesResponse>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(bad_request("prompt cannot be empty"));
    }

    // First call of a flow opens the creation session.
    if body.problem_description.is_some() {
        state.tracker.start_creation_session(
            &body.user_id,
            &body.kid_id,
            body.problem_description.as_deref(),
        );
    }

    state
        .tracker
        .start_title_generation(&body.user_id, &body.kid_id);
    let started = Instant::now();
    let result = state
        .provider
        .generate_titles(&TitleRequest {
            prompt: body.prompt.clone(),
            count: body.count,
        })
        .await;
    let elapsed_ms = started.elapsed().as_millis() as i64;

    match result {
        Ok(batch) => {
            state.tracker.complete_title_generation(
                &body.user_id,
                &body.kid_id,
                batch.titles.len() as u32,
                Some(batch.cost_usd),
            );
            state.tracker.track_api_performance(
                "/api/generate/titles",
                elapsed_ms,
                true,
                Some(&body.user_id),
            );
            Ok(Json(GenerateTitlesResponse {
                titles: batch.titles,
                cost_usd: batch.cost_usd,
            }))
        }
        Err(e) => {
            state
                .tracker
                .error_creation_session(&body.user_id, &body.kid_id, &e.to_string());
            state.tracker.track_api_performance(
                "/api/generate/titles",
                elapsed_ms,
                false,
                Some(&body.user_id),
            );
            Err(provider_error(&e))
        }
    }
}

/// POST /api/generate/text
pub async fn generate_text(
    State(state): State<ApiState>,
    Json(body): Json<GenerateTextRequest>,
) -> Result<Json<GenerateTextResponse>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(bad_request("prompt cannot be empty"));
    }

    state
        .tracker
        .start_text_generation(&body.user_id, &body.kid_id);
    let started = Instant::now();
    let result = state
        .provider
        .generate_text(&TextRequest {
            prompt: body.prompt.clone(),
            page_count: body.page_count,
        })
        .await;
    let elapsed_ms = started.elapsed().as_millis() as i64;

    match result {
        Ok(story) => {
            state.tracker.complete_text_generation(
                &body.user_id,
                &body.kid_id,
                story.pages.len() as u32,
                Some(story.cost_usd),
            );
            state.tracker.track_api_performance(
                "/api/generate/text",
                elapsed_ms,
                true,
                Some(&body.user_id),
            );
            Ok(Json(GenerateTextResponse {
                pages: story.pages,
                cost_usd: story.cost_usd,
            }))
        }
        Err(e) => {
            state
                .tracker
                .error_creation_session(&body.user_id, &body.kid_id, &e.to_string());
            state.tracker.track_api_performance(
                "/api/generate/text",
                elapsed_ms,
                false,
                Some(&body.user_id),
            );
            Err(provider_error(&e))
        }
    }
}

/// POST /api/generate/image
pub async fn generate_image(
    State(state): State<ApiState>,
    Json(body): Json<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(bad_request("prompt cannot be empty"));
    }

    state
        .tracker
        .start_image_generation(&body.user_id, &body.story_id, &body.page_type);
    let started = Instant::now();
    let result = state
        .provider
        .generate_image(&ImageRequest {
            prompt: body.prompt.clone(),
            size: body.size.clone(),
        })
        .await;
    let elapsed_ms = started.elapsed().as_millis() as i64;

    match result {
        Ok(image) => {
            let cost = state.tracker.complete_image_generation(
                &body.user_id,
                &body.story_id,
                &body.page_type,
                Some(image.cost_usd),
                body.is_regeneration,
            );
            // This handler is the creation orchestrator: it alone decides
            // whether the image cost joins a creation session.
            if let (Some(kid_id), Some(cost)) = (body.kid_id.as_deref(), cost) {
                state
                    .tracker
                    .record_image_cost(&body.user_id, kid_id, cost);
            }
            state.tracker.track_api_performance(
                "/api/generate/image",
                elapsed_ms,
                true,
                Some(&body.user_id),
            );
            Ok(Json(GenerateImageResponse {
                url: image.url,
                cost_usd: image.cost_usd,
            }))
        }
        Err(e) => {
            state.tracker.error_image_generation(
                &body.user_id,
                &body.story_id,
                &body.page_type,
                &e.to_string(),
            );
            state.tracker.track_api_performance(
                "/api/generate/image",
                elapsed_ms,
                false,
                Some(&body.user_id),
            );
            Err(provider_error(&e))
        }
    }
}

/// POST /api/stories/complete
pub async fn complete_story(
    State(state): State<ApiState>,
    Json(body): Json<CompleteStoryRequest>,
) -> Json<CompleteStoryResponse> {
    let story_id = body
        .story_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    state.tracker.complete_creation_session(
        &story_id,
        &body.user_id,
        &body.kid_id,
        body.story_title.as_deref(),
    );
    Json(CompleteStoryResponse { story_id })
}

fn store_error(e: StorymillError) -> ApiError {
    let status = match &e {
        StorymillError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
        StorymillError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.profiles.get_user(&id).await.map_err(store_error)?;
    Ok(Json(profile))
}

/// GET /api/kids/{id}
pub async fn get_kid(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<KidProfile>, ApiError> {
    let profile = state.profiles.get_kid(&id).await.map_err(store_error)?;
    Ok(Json(profile))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
