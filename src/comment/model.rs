use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::comment;
use crate::error::AppError;

/// Author snapshot embedded in a comment. The email is kept for moderators
/// and never serialized.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUser {
    pub id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub name: String,
    #[serde(skip_serializing)]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: CommentUser,
    pub post_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub is_approved: bool,
    pub likes: i32,
    /// Filled per read by the tree builder; never stored.
    pub replies: Vec<Comment>,
}

impl From<comment::Model> for Comment {
    fn from(m: comment::Model) -> Self {
        Self {
            id: m.id,
            created_at: m.created_at,
            updated_at: m.updated_at,
            author: CommentUser {
                id: m.author_id,
                created_at: m.created_at,
                name: m.author_name,
                email: m.author_email,
                website: m.author_website,
            },
            post_id: m.post_id,
            parent_id: m.parent_id,
            content: m.content,
            is_approved: m.is_approved,
            likes: m.likes,
            replies: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

impl PageRequest {
    /// Returns `(offset, limit)` with `page >= 1` and `1 <= size <= max_size`.
    pub fn bounds(&self, max_size: u64) -> (u64, u64) {
        let page = self.page.max(1);
        let size = self.size.clamp(1, max_size.max(1));
        ((page - 1).saturating_mul(size), size)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "created_at")]
    CreatedAt,
    #[serde(rename = "likes")]
    Likes,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommentSort {
    pub field: SortField,
    pub order: SortOrder,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_name: String,
    pub content: String,
    pub author_name: String,
    pub author_email: String,
    pub author_website: Option<String>,
    pub parent_id: Option<i32>,
}

impl NewComment {
    /// Trims every field and rejects the request before any store access.
    pub fn validated(self) -> Result<Self, AppError> {
        let post_name = required("postName", &self.post_name)?;
        let content = required("content", &self.content)?;
        let author_name = required("authorName", &self.author_name)?;
        let author_email = required("authorEmail", &self.author_email)?;
        if !author_email.contains('@') {
            return Err(AppError::validation("authorEmail", "malformed email address"));
        }
        let author_website = self
            .author_website
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty());
        let parent_id = self.parent_id.map(|id| valid_id("parentId", id)).transpose()?;

        Ok(Self {
            post_name,
            content,
            author_name,
            author_email,
            author_website,
            parent_id,
        })
    }
}

pub fn valid_id(field: &'static str, id: i32) -> Result<i32, AppError> {
    if id <= 0 {
        return Err(AppError::validation(field, "must be a positive id"));
    }
    Ok(id)
}

pub fn required(field: &'static str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input() -> NewComment {
        NewComment {
            post_name: " hello-world ".to_string(),
            content: " first! ".to_string(),
            author_name: "ann".to_string(),
            author_email: "ann@example.com".to_string(),
            author_website: Some("   ".to_string()),
            parent_id: None,
        }
    }

    #[test]
    fn validation_trims_and_drops_blank_website() {
        let v = input().validated().unwrap();
        assert_eq!(v.post_name, "hello-world");
        assert_eq!(v.content, "first!");
        assert_eq!(v.author_website, None);
    }

    #[test]
    fn validation_names_the_offending_field() {
        let mut bad = input();
        bad.content = "  ".to_string();
        assert!(matches!(bad.validated(), Err(AppError::Validation { field: "content", .. })));

        let mut bad = input();
        bad.author_email = "nobody".to_string();
        assert!(matches!(bad.validated(), Err(AppError::Validation { field: "authorEmail", .. })));

        let mut bad = input();
        bad.parent_id = Some(0);
        assert!(matches!(bad.validated(), Err(AppError::Validation { field: "parentId", .. })));
    }

    #[test]
    fn page_bounds_are_clamped() {
        assert_eq!(PageRequest { page: 0, size: 0 }.bounds(100), (0, 1));
        assert_eq!(PageRequest { page: 3, size: 10 }.bounds(100), (20, 10));
        assert_eq!(PageRequest { page: 2, size: 500 }.bounds(100), (100, 100));
    }

    #[test]
    fn sort_parses_wire_names() {
        let sort: CommentSort = serde_json::from_value(json!({"field": "likes", "order": "DESC"})).unwrap();
        assert_eq!(sort.field, SortField::Likes);
        assert_eq!(sort.order, SortOrder::Desc);
        let sort: CommentSort = serde_json::from_value(json!({})).unwrap();
        assert_eq!(sort, CommentSort::default());
        assert!(serde_json::from_value::<CommentSort>(json!({"field": "author"})).is_err());
    }

    #[test]
    fn author_email_is_never_serialized() {
        let now = Utc::now();
        let c = Comment::from(comment::Model {
            id: 1,
            post_id: 1,
            parent_id: None,
            content: "hi".to_string(),
            author_id: None,
            author_name: "ann".to_string(),
            author_email: "ann@example.com".to_string(),
            author_website: None,
            is_approved: true,
            likes: 0,
            created_at: now,
            updated_at: now,
        });
        let out = serde_json::to_value(&c).unwrap();
        assert_eq!(out["author"]["name"], "ann");
        assert!(out["author"].get("email").is_none());
        assert!(!out.to_string().contains("ann@example.com"));
    }
}
