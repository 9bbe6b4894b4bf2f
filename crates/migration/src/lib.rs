pub use sea_orm_migration::prelude::*;

mod m20250712_create_interactions_table;
mod m20250712_add_interaction_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250712_create_interactions_table::Migration),
            Box::new(m20250712_add_interaction_indexes::Migration),
        ]
    }
}
