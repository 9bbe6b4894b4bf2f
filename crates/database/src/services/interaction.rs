use crate::entities::interactions;
use chrono::Utc;
use log::warn;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select,
};

/// Persistence for question/answer interactions
#[derive(Clone)]
pub struct InteractionService {
    db: DatabaseConnection,
}

impl InteractionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persist a new interaction and return it with its assigned id
    pub async fn create(
        &self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<interactions::Model, DbErr> {
        let now = Utc::now();

        interactions::ActiveModel {
            question: Set(question.into()),
            answer: Set(answer.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    /// All interactions that have not been soft-deleted, oldest first
    pub async fn list_all(&self) -> Result<Vec<interactions::Model>, DbErr> {
        Self::live()
            .order_by_asc(interactions::Column::Id)
            .all(&self.db)
            .await
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        Self::live().count(&self.db).await
    }

    /// Whether the database is reachable and holds at least one interaction
    pub async fn health_probe(&self) -> bool {
        match Self::live().one(&self.db).await {
            Ok(row) => row.is_some(),
            Err(err) => {
                warn!("Interaction store unreachable: {err}");
                false
            }
        }
    }

    fn live() -> Select<interactions::Entity> {
        interactions::Entity::find().filter(interactions::Column::DeletedAt.is_null())
    }
}
