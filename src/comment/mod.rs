//! Threaded comments: storage, tree assembly, moderation, like toggles and
//! cascading deletes behind [`CommentService`].

pub mod cascade;
pub mod like;
pub mod model;
pub mod moderation;
pub mod store;
pub mod tree;

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use log::debug;
use sea_orm::{DatabaseConnection, Set};

use crate::auth::AuthUser;
use crate::entity::{comment, post};
use crate::error::AppError;
pub use model::{Comment, CommentSort, NewComment, PageRequest};
use model::{required, valid_id};
use moderation::{require_admin, require_login, ModerationState};

/// Entry point used by the transport layer. Holds no per-request state; every
/// call goes to the store and is bounded by the configured deadline. When the
/// deadline elapses the in-flight transaction is dropped and rolled back.
#[derive(Clone)]
pub struct CommentService {
    db: DatabaseConnection,
    timeout: Duration,
    page_size_max: u64,
}

impl CommentService {
    pub fn new(db: DatabaseConnection, timeout: Duration, page_size_max: u64) -> Self {
        Self { db, timeout, page_size_max }
    }

    /// Approved comments of a post, one page at a time, as a reply tree.
    /// Pagination applies to the flat list, so replies whose parent is on
    /// another page are not returned.
    pub async fn list_comments(
        &self,
        post_name: &str,
        page: PageRequest,
        sort: CommentSort,
    ) -> Result<Vec<Comment>, AppError> {
        let post_name = required("postName", post_name)?;
        let (offset, limit) = page.bounds(self.page_size_max);
        self.with_deadline("list_comments", async move {
            let post = self.find_post(&post_name).await?;
            let rows = store::list_approved(&self.db, post.id, sort, offset, limit).await?;
            Ok(tree::build_tree(rows.into_iter().map(Comment::from).collect()))
        })
        .await
    }

    pub async fn create_comment(&self, input: NewComment, caller: Option<&AuthUser>) -> Result<Comment, AppError> {
        let input = input.validated()?;
        let author_id = caller.map(|c| c.user_id);
        self.with_deadline("create_comment", async move {
            let post = self.find_post(&input.post_name).await?;
            if let Some(parent_id) = input.parent_id {
                let parent = store::find_comment(&self.db, parent_id)
                    .await?
                    .ok_or(AppError::NotFound("parent comment"))?;
                if parent.post_id != post.id {
                    return Err(AppError::validation("parentId", "parent comment belongs to another post"));
                }
            }

            let now = Utc::now();
            let model = comment::ActiveModel {
                post_id: Set(post.id),
                parent_id: Set(input.parent_id),
                content: Set(input.content),
                author_id: Set(author_id),
                author_name: Set(input.author_name),
                author_email: Set(input.author_email),
                author_website: Set(input.author_website),
                is_approved: Set(ModerationState::INITIAL.is_approved()),
                likes: Set(0),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            let inserted = store::insert_comment(&self.db, model).await?;
            debug!("comment created id={} post={} parent={:?}", inserted.id, post.id, inserted.parent_id);
            Ok(Comment::from(inserted))
        })
        .await
    }

    pub async fn toggle_like(&self, comment_id: i32, caller: Option<&AuthUser>) -> Result<Comment, AppError> {
        let comment_id = valid_id("id", comment_id)?;
        let caller = require_login(caller)?;
        let (_, updated) = self
            .with_deadline("toggle_like", like::toggle_like(&self.db, comment_id, caller.user_id))
            .await?;
        Ok(updated.into())
    }

    pub async fn approve_comment(&self, comment_id: i32, caller: Option<&AuthUser>) -> Result<Comment, AppError> {
        let comment_id = valid_id("id", comment_id)?;
        require_admin(caller)?;
        let approved = self
            .with_deadline("approve_comment", moderation::approve(&self.db, comment_id))
            .await?;
        Ok(approved.into())
    }

    pub async fn delete_comment(&self, comment_id: i32, caller: Option<&AuthUser>) -> Result<Comment, AppError> {
        let comment_id = valid_id("id", comment_id)?;
        require_admin(caller)?;
        let (snapshot, _) = self
            .with_deadline("delete_comment", cascade::delete_comment(&self.db, comment_id))
            .await?;
        Ok(snapshot.into())
    }

    /// Moderation queue: pending comments of a post, oldest first, flat.
    pub async fn list_pending(
        &self,
        post_name: &str,
        page: PageRequest,
        caller: Option<&AuthUser>,
    ) -> Result<Vec<Comment>, AppError> {
        let post_name = required("postName", post_name)?;
        require_admin(caller)?;
        let (offset, limit) = page.bounds(self.page_size_max);
        self.with_deadline("list_pending", async move {
            let post = self.find_post(&post_name).await?;
            let rows = store::list_pending(&self.db, post.id, offset, limit).await?;
            Ok(rows.into_iter().map(Comment::from).collect())
        })
        .await
    }

    pub async fn approve_post_comments(&self, post_name: &str, caller: Option<&AuthUser>) -> Result<u64, AppError> {
        let post_name = required("postName", post_name)?;
        require_admin(caller)?;
        self.with_deadline("approve_post_comments", async move {
            let post = self.find_post(&post_name).await?;
            let approved = moderation::approve_post(&self.db, post.id).await?;
            debug!("post comments approved post={} count={}", post.id, approved);
            Ok(approved)
        })
        .await
    }

    async fn find_post(&self, name: &str) -> Result<post::Model, AppError> {
        store::find_post_by_name(&self.db, name)
            .await?
            .ok_or(AppError::NotFound("post"))
    }

    async fn with_deadline<T, F>(&self, op: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| AppError::Timeout { op })?
    }
}
