use chrono::NaiveDateTime;

#[derive(Debug, Default, PartialEq, Clone)]
pub struct User {
    pub id: i32,
    pub sub: String,
    /// Number of posts created by this user.
    pub posts: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
