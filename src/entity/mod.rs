pub mod comment;
pub mod comment_like;
pub mod post;
pub mod user;
