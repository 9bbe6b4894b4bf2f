use chrono::{DateTime, Utc};
use database::entities::interactions;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InteractionResponse {
    pub id: i32,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<interactions::Model> for InteractionResponse {
    fn from(model: interactions::Model) -> Self {
        Self {
            id: model.id,
            question: model.question,
            answer: model.answer,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
