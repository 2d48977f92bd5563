use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder,
};

use crate::active_models::{prelude::*, *};
use entity::prelude::*;

use self::sea_orm_active_enums::Category as DbCategory;

#[derive(Clone, Debug)]
pub struct PostRepository {
    db: DatabaseConnection,
}

impl PostRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<post::Model> for PostEntity {
    fn from(value: post::Model) -> Self {
        Self {
            id: value.id,
            title: value.title,
            category: value.category.into(),
            description: value.description,
            thumbnail: value.thumbnail,
            creator_id: value.creator_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<PostEntity> for post::ActiveModel {
    fn from(value: PostEntity) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: if value.id == i32::default() {
                ActiveValue::not_set()
            } else {
                ActiveValue::Set(value.id)
            },
            title: ActiveValue::Set(value.title),
            category: ActiveValue::Set(value.category.into()),
            description: ActiveValue::Set(value.description),
            thumbnail: ActiveValue::Set(value.thumbnail),
            creator_id: ActiveValue::Set(value.creator_id),
            created_at: if value.created_at == NaiveDateTime::default() {
                ActiveValue::Set(now)
            } else {
                ActiveValue::Set(value.created_at)
            },
            updated_at: if value.updated_at == NaiveDateTime::default() {
                ActiveValue::Set(now)
            } else {
                ActiveValue::Set(value.updated_at)
            },
        }
    }
}

impl PostRepository {
    /// Every post, most recently updated first.
    pub async fn find_all(&self) -> anyhow::Result<Vec<PostEntity>> {
        let posts = Post::find()
            .order_by_desc(post::Column::UpdatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await?;

        Ok(posts.into_iter().map(PostEntity::from).collect())
    }

    pub async fn find_by_id(
        &self,
        id: i32,
    ) -> anyhow::Result<Option<PostEntity>> {
        let post = Post::find_by_id(id).one(&self.db).await?;

        Ok(post.map(PostEntity::from))
    }

    pub async fn find_by_category(
        &self,
        category: Category,
    ) -> anyhow::Result<Vec<PostEntity>> {
        let posts = Post::find()
            .filter(post::Column::Category.eq(DbCategory::from(category)))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await?;

        Ok(posts.into_iter().map(PostEntity::from).collect())
    }

    pub async fn find_by_creator(
        &self,
        creator_id: i32,
    ) -> anyhow::Result<Vec<PostEntity>> {
        let posts = Post::find()
            .filter(post::Column::CreatorId.eq(creator_id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await?;

        Ok(posts.into_iter().map(PostEntity::from).collect())
    }

    pub async fn create(&self, post: PostEntity) -> anyhow::Result<PostEntity> {
        let mut model = post::ActiveModel::from(post);
        model.id = ActiveValue::not_set();

        let post = model.insert(&self.db).await?;

        Ok(PostEntity::from(post))
    }

    /// Overwrites the editable columns of an existing post and bumps
    /// `updated_at`. Returns `None` when no row has the post's id.
    pub async fn update(
        &self,
        post: PostEntity,
    ) -> anyhow::Result<Option<PostEntity>> {
        let model = post::ActiveModel {
            id: ActiveValue::Unchanged(post.id),
            title: ActiveValue::Set(post.title),
            category: ActiveValue::Set(post.category.into()),
            description: ActiveValue::Set(post.description),
            thumbnail: ActiveValue::Set(post.thumbnail),
            updated_at: ActiveValue::Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        match model.update(&self.db).await {
            Ok(post) => Ok(Some(PostEntity::from(post))),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, id: i32) -> anyhow::Result<bool> {
        let result = Post::delete_by_id(id).exec(&self.db).await?;

        Ok(result.rows_affected > 0)
    }
}

macro_rules! impl_from {
    ($from:ident, $to:ident, [$($variant:ident),* $(,)?]) => {
        impl From<$from> for $to {
            fn from(value: $from) -> Self {
                match value {
                    $($from::$variant => $to::$variant,)*
                }
            }
        }

        impl From<$to> for $from {
            fn from(value: $to) -> Self {
                match value {
                    $($to::$variant => $from::$variant,)*
                }
            }
        }
    };
}

impl_from!(
    Category,
    DbCategory,
    [
        Agriculture,
        Business,
        Education,
        Entertainment,
        Art,
        Investment,
        Uncategorized,
        Weather,
    ]
);

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, NaiveDateTime};
    use entity::prelude::*;

    use crate::init_in_memory;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn post(title: &str, category: Category, creator_id: i32) -> PostEntity {
        PostEntity {
            title: title.to_string(),
            category,
            description: "a description long enough".to_string(),
            thumbnail: format!("{title}.png"),
            creator_id,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_find_all_sorted_by_updated_at_desc() {
        let repo = init_in_memory().await.unwrap();

        // Arrange
        for (title, day) in [("old", 1), ("newest", 3), ("middle", 2)] {
            repo.post
                .create(PostEntity {
                    created_at: at(day),
                    updated_at: at(day),
                    ..post(title, Category::Art, 1)
                })
                .await
                .unwrap();
        }

        // Act
        let posts = repo.post.find_all().await.unwrap();

        // Assert
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "middle", "old"]);
    }

    #[tokio::test]
    async fn test_find_by_category_returns_only_matching() {
        let repo = init_in_memory().await.unwrap();

        // Arrange
        repo.post.create(post("a", Category::Art, 1)).await.unwrap();
        repo.post.create(post("b", Category::Weather, 1)).await.unwrap();
        repo.post.create(post("c", Category::Art, 2)).await.unwrap();

        // Act
        let posts = repo.post.find_by_category(Category::Art).await.unwrap();

        // Assert
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.category == Category::Art));
    }

    #[tokio::test]
    async fn test_find_by_creator_newest_first() {
        let repo = init_in_memory().await.unwrap();

        // Arrange
        for (title, day, creator) in [("first", 1, 7), ("other", 2, 8), ("second", 3, 7)] {
            repo.post
                .create(PostEntity {
                    created_at: at(day),
                    updated_at: at(day),
                    ..post(title, Category::Business, creator)
                })
                .await
                .unwrap();
        }

        // Act
        let posts = repo.post.find_by_creator(7).await.unwrap();

        // Assert
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at_and_keeps_creator() {
        let repo = init_in_memory().await.unwrap();

        // Arrange
        let created = repo
            .post
            .create(PostEntity {
                created_at: at(1),
                updated_at: at(1),
                ..post("before", Category::Art, 3)
            })
            .await
            .unwrap();

        // Act
        let updated = repo
            .post
            .update(PostEntity {
                title: "after".to_string(),
                category: Category::Education,
                thumbnail: "after.png".to_string(),
                ..created.clone()
            })
            .await
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "after");
        assert_eq!(updated.category, Category::Education);
        assert_eq!(updated.thumbnail, "after.png");
        assert_eq!(updated.creator_id, 3);
        assert_eq!(updated.created_at, at(1));
        assert!(updated.updated_at > at(1));
    }

    #[tokio::test]
    async fn test_update_missing_post_returns_none() {
        let repo = init_in_memory().await.unwrap();

        let updated = repo
            .post
            .update(PostEntity {
                id: 42,
                ..post("ghost", Category::Art, 1)
            })
            .await
            .unwrap();

        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = init_in_memory().await.unwrap();

        // Arrange
        let created = repo.post.create(post("gone", Category::Art, 1)).await.unwrap();

        // Act
        let deleted = repo.post.delete(created.id).await.unwrap();
        let deleted_again = repo.post.delete(created.id).await.unwrap();

        // Assert
        assert!(deleted);
        assert!(!deleted_again);
        assert!(repo.post.find_by_id(created.id).await.unwrap().is_none());
    }
}
