use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, PartialEq, Clone)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub category: Category,
    pub description: String,
    /// File name inside the thumbnail directory.
    pub thumbnail: String,
    pub creator_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(
    Debug,
    Default,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
pub enum Category {
    Agriculture,
    Business,
    Education,
    Entertainment,
    Art,
    Investment,
    #[default]
    Uncategorized,
    Weather,
}
