pub mod post;
pub mod user;

pub mod prelude {
    pub use crate::post::Category;
    pub use crate::post::Post as PostEntity;
    pub use crate::user::User as UserEntity;
}
