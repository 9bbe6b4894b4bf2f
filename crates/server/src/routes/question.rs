use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use log::error;

use crate::{
    AppState,
    dtos::question::{InteractionResponse, QuestionRequest},
};

/// Ask a question and receive a randomly chosen answer
#[utoipa::path(
    post,
    path = "/questions",
    request_body = QuestionRequest,
    responses(
        (status = 201, description = "Question answered and recorded", body = InteractionResponse),
        (status = 400, description = "Body is not a JSON object with a string `question`"),
        (status = 500, description = "Interaction could not be saved")
    ),
    tag = "Questions"
)]
pub async fn post_question(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<InteractionResponse>), StatusCode> {
    // Parsed by hand so the Content-Type header is not required
    let request: QuestionRequest = serde_json::from_slice(&body).map_err(|err| {
        error!(
            "[post_question] Failed to parse request '{}': {err}",
            String::from_utf8_lossy(&body)
        );
        StatusCode::BAD_REQUEST
    })?;

    let answer = state.answers.pick();

    let interaction = state
        .interactions
        .create(request.question, answer)
        .await
        .map_err(|err| {
            error!("[post_question] Failed to save interaction: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok((StatusCode::CREATED, Json(interaction.into())))
}

/// List every recorded interaction, oldest first
#[utoipa::path(
    get,
    path = "/questions",
    responses(
        (status = 200, description = "All recorded interactions", body = Vec<InteractionResponse>),
        (status = 404, description = "Interactions could not be retrieved")
    ),
    tag = "Questions"
)]
pub async fn get_questions(
    State(state): State<AppState>,
) -> Result<Json<Vec<InteractionResponse>>, StatusCode> {
    let interactions = state.interactions.list_all().await.map_err(|err| {
        error!("[get_questions] Failed to retrieve interactions: {err}");
        StatusCode::NOT_FOUND
    })?;

    Ok(Json(interactions.into_iter().map(Into::into).collect()))
}
