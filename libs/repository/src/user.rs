use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait,
    DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::active_models::{prelude::*, *};
use entity::prelude::*;

#[derive(Clone, Debug)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<user::Model> for UserEntity {
    fn from(value: user::Model) -> Self {
        UserEntity {
            id: value.id,
            sub: value.sub,
            posts: value.posts,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<UserEntity> for user::ActiveModel {
    fn from(value: UserEntity) -> Self {
        Self {
            id: {
                if value.id == i32::default() {
                    ActiveValue::not_set()
                } else {
                    ActiveValue::Set(value.id)
                }
            },
            sub: ActiveValue::Set(value.sub),
            posts: ActiveValue::Set(value.posts),
            created_at: if value.created_at == NaiveDateTime::default() {
                ActiveValue::Set(Utc::now().naive_utc())
            } else {
                ActiveValue::Set(value.created_at)
            },
            updated_at: ActiveValue::Set(Utc::now().naive_utc()),
        }
    }
}

impl UserRepository {
    pub async fn find_by_id(
        &self,
        id: i32,
    ) -> anyhow::Result<Option<UserEntity>> {
        let user = User::find_by_id(id).one(&self.db).await?;

        Ok(user.map(UserEntity::from))
    }

    pub async fn find_by_sub(
        &self,
        sub: &str,
    ) -> anyhow::Result<Option<UserEntity>> {
        let user = User::find()
            .filter(user::Column::Sub.eq(sub))
            .one(&self.db)
            .await?;

        Ok(user.map(UserEntity::from))
    }

    pub async fn save(&self, user: UserEntity) -> anyhow::Result<i32> {
        let user = user::ActiveModel::from(user).insert(&self.db).await?;

        Ok(user.id)
    }

    pub async fn increment_posts(&self, user_id: i32) -> anyhow::Result<()> {
        self.add_posts(user_id, 1).await
    }

    pub async fn decrement_posts(&self, user_id: i32) -> anyhow::Result<()> {
        self.add_posts(user_id, -1).await
    }

    // Single statement, so concurrent creates/deletes cannot lose a count.
    async fn add_posts(&self, user_id: i32, delta: i32) -> anyhow::Result<()> {
        User::update_many()
            .col_expr(
                user::Column::Posts,
                Expr::col(user::Column::Posts).add(delta),
            )
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use entity::prelude::*;

    use crate::init_in_memory;

    #[tokio::test]
    async fn test_save_and_find_by_sub() {
        let repo = init_in_memory().await.unwrap();

        // Arrange
        let id = repo
            .user
            .save(UserEntity {
                sub: "alice".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        // Act
        let user = repo.user.find_by_sub("alice").await.unwrap();
        let missing = repo.user.find_by_sub("bob").await.unwrap();

        // Assert
        let user = user.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.posts, 0);
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_increment_and_decrement_posts() {
        let repo = init_in_memory().await.unwrap();

        // Arrange
        let id = repo
            .user
            .save(UserEntity {
                sub: "carol".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        // Act
        repo.user.increment_posts(id).await.unwrap();
        repo.user.increment_posts(id).await.unwrap();
        repo.user.decrement_posts(id).await.unwrap();

        // Assert
        let user = repo.user.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.posts, 1);
    }
}
