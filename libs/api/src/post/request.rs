use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
};
use entity::prelude::*;
use utoipa::ToSchema;

use crate::ApiError;

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Multipart body shared by create and edit. Every part is optional here;
/// each operation decides what it requires.
#[derive(Debug, Default, ToSchema)]
pub struct PostForm {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub thumbnail: Option<Upload>,
}

pub struct NewPost {
    pub title: String,
    pub category: Category,
    pub description: String,
    pub thumbnail: Upload,
}

pub struct PostEdit {
    pub title: String,
    pub category: Category,
    pub description: String,
    pub thumbnail: Option<Upload>,
}

const MIN_DESCRIPTION_CHARS: usize = 12;

impl PostForm {
    pub async fn from_multipart(
        mut multipart: Multipart,
    ) -> Result<Self, ApiError> {
        let mut form = PostForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "title" => form.title = Some(field.text().await?),
                "category" => form.category = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "thumbnail" => {
                    let file_name =
                        field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;

                    // browsers send an empty part when no file was chosen
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }

                    form.thumbnail = Some(Upload { file_name, bytes });
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn into_new_post(self) -> Result<NewPost, ApiError> {
        let (Some(title), Some(category), Some(description), Some(thumbnail)) = (
            non_blank(self.title),
            non_blank(self.category),
            non_blank(self.description),
            self.thumbnail,
        ) else {
            return Err(ApiError::ValidationError(
                "Fill in all fields and choose thumbnail.".to_string(),
            ));
        };

        Ok(NewPost {
            title,
            category: parse_category(&category)?,
            description,
            thumbnail,
        })
    }

    pub fn into_post_edit(self) -> Result<PostEdit, ApiError> {
        let Some(title) = non_blank(self.title) else {
            return Err(ApiError::ValidationError(
                "Title is required".to_string(),
            ));
        };
        let Some(category) = non_blank(self.category) else {
            return Err(ApiError::ValidationError(
                "Category is required".to_string(),
            ));
        };
        let description = self.description.unwrap_or_default();
        if description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
            return Err(ApiError::ValidationError(format!(
                "Description must be {MIN_DESCRIPTION_CHARS} characters long"
            )));
        }

        Ok(PostEdit {
            title,
            category: parse_category(&category)?,
            description,
            thumbnail: self.thumbnail,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_category(label: &str) -> Result<Category, ApiError> {
    label.parse::<Category>().map_err(|_| {
        ApiError::ValidationError(format!("{label} is not supported."))
    })
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::ClientError(e.body_text())
        }
    }
}

#[cfg(test)]
mod test {
    use axum::body::Bytes;
    use entity::prelude::*;

    use super::{PostForm, Upload};
    use crate::ApiError;

    fn form() -> PostForm {
        PostForm {
            title: Some("Harvest".to_string()),
            category: Some("Agriculture".to_string()),
            description: Some("Notes from the autumn harvest".to_string()),
            thumbnail: Some(Upload {
                file_name: "field.png".to_string(),
                bytes: Bytes::from_static(b"png"),
            }),
        }
    }

    #[test]
    fn test_new_post_requires_thumbnail() {
        let result = PostForm {
            thumbnail: None,
            ..form()
        }
        .into_new_post();

        assert_eq!(
            result.err(),
            Some(ApiError::ValidationError(
                "Fill in all fields and choose thumbnail.".to_string()
            ))
        );
    }

    #[test]
    fn test_new_post_rejects_blank_title() {
        let result = PostForm {
            title: Some("   ".to_string()),
            ..form()
        }
        .into_new_post();

        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_new_post_rejects_unknown_category() {
        let result = PostForm {
            category: Some("Sports".to_string()),
            ..form()
        }
        .into_new_post();

        assert_eq!(
            result.err(),
            Some(ApiError::ValidationError(
                "Sports is not supported.".to_string()
            ))
        );
    }

    #[test]
    fn test_new_post() {
        let post = form().into_new_post().unwrap();

        assert_eq!(post.title, "Harvest");
        assert_eq!(post.category, Category::Agriculture);
        assert_eq!(post.thumbnail.file_name, "field.png");
    }

    #[test]
    fn test_post_edit_validation_order() {
        let cases = [
            (
                PostForm {
                    title: None,
                    category: None,
                    ..form()
                },
                "Title is required",
            ),
            (
                PostForm {
                    category: Some("".to_string()),
                    description: None,
                    ..form()
                },
                "Category is required",
            ),
            (
                PostForm {
                    description: Some("  too short  ".to_string()),
                    category: Some("Nope".to_string()),
                    ..form()
                },
                "Description must be 12 characters long",
            ),
            (
                PostForm {
                    category: Some("Nope".to_string()),
                    ..form()
                },
                "Nope is not supported.",
            ),
        ];

        for (form, message) in cases {
            let result = form.into_post_edit();

            assert_eq!(
                result.err(),
                Some(ApiError::ValidationError(message.to_string()))
            );
        }
    }

    #[test]
    fn test_post_edit_thumbnail_is_optional() {
        let edit = PostForm {
            thumbnail: None,
            ..form()
        }
        .into_post_edit()
        .unwrap();

        assert!(edit.thumbnail.is_none());
        assert_eq!(edit.category, Category::Agriculture);
    }
}
