use crate::{
    dtos::question::{InteractionResponse, QuestionRequest},
    routes::{health, question},
};
use utoipa::OpenApi;

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        question::post_question,
        question::get_questions,
        health::health,
        health::readiness
    ),
    components(schemas(QuestionRequest, InteractionResponse)),
    tags(
        (name = "Questions", description = "Ask questions and browse past answers"),
        (name = "Health", description = "Liveness and readiness probes"),
    ),
    info(
        title = "Eightball API",
        version = "1.0.0",
        description = "Magic eight ball as a service",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;
