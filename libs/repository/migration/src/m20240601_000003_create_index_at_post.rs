use sea_orm_migration::prelude::*;

use crate::m20240601_000002_create_post_table::Post;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: [(&str, Post); 3] = [
    ("idx_post_updated_at", Post::UpdatedAt),
    ("idx_post_category", Post::Category),
    ("idx_post_creator_id", Post::CreatorId),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, column) in INDEXES {
            manager
                .create_index(
                    Index::create()
                        .table(Post::Table)
                        .name(name)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, _) in INDEXES {
            manager
                .drop_index(Index::drop().table(Post::Table).name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}
