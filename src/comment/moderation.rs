//! Moderation lifecycle: every comment starts `Pending` and only an admin can
//! move it to `Approved`. Deletion is the only other way out.

use chrono::Utc;
use sea_orm::ConnectionTrait;

use super::store;
use crate::auth::AuthUser;
use crate::entity::comment;
use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationState {
    Pending,
    Approved,
}

impl ModerationState {
    pub const INITIAL: ModerationState = ModerationState::Pending;

    pub fn of(model: &comment::Model) -> Self {
        if model.is_approved {
            ModerationState::Approved
        } else {
            ModerationState::Pending
        }
    }

    /// Only approved comments are visible on public read paths.
    pub fn is_approved(self) -> bool {
        self == ModerationState::Approved
    }
}

pub fn require_login(caller: Option<&AuthUser>) -> Result<&AuthUser, AppError> {
    caller.ok_or_else(AppError::need_login)
}

pub fn require_admin(caller: Option<&AuthUser>) -> Result<&AuthUser, AppError> {
    let caller = require_login(caller)?;
    if !caller.is_admin() {
        return Err(AppError::admin_only());
    }
    Ok(caller)
}

/// Approves a pending comment and refreshes `updated_at`. Approving an
/// already approved comment returns it unchanged.
pub async fn approve<C: ConnectionTrait>(db: &C, comment_id: i32) -> Result<comment::Model, AppError> {
    let model = store::find_comment(db, comment_id)
        .await?
        .ok_or(AppError::NotFound("comment"))?;
    match ModerationState::of(&model) {
        ModerationState::Approved => Ok(model),
        ModerationState::Pending => store::mark_approved(db, model, Utc::now()).await,
    }
}

pub async fn approve_post<C: ConnectionTrait>(db: &C, post_id: i32) -> Result<u64, AppError> {
    store::mark_post_approved(db, post_id, Utc::now()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn only_admins_pass_the_admin_gate() {
        assert!(matches!(require_admin(None), Err(AppError::Permission(_))));
        assert!(matches!(require_admin(Some(&reader(2))), Err(AppError::Permission(_))));
        assert_eq!(require_admin(Some(&admin())).unwrap().user_id, 1);
        assert_eq!(require_login(Some(&reader(2))).unwrap().user_id, 2);
    }

    #[actix_rt::test]
    async fn approve_moves_pending_to_approved_and_touches_updated_at() {
        let db = setup_db().await;
        let post = seed_post(&db, "p").await;
        let pending = seed_comment(&db, post.id, None, false, 1).await;
        assert_eq!(ModerationState::of(&pending), ModerationState::INITIAL);

        let approved = approve(&db, pending.id).await.unwrap();
        assert_eq!(ModerationState::of(&approved), ModerationState::Approved);
        assert!(approved.updated_at > pending.updated_at);

        let again = approve(&db, pending.id).await.unwrap();
        assert_eq!(again.updated_at, approved.updated_at);
    }

    #[actix_rt::test]
    async fn approve_post_only_counts_pending_comments() {
        let db = setup_db().await;
        let post = seed_post(&db, "p").await;
        let other = seed_post(&db, "q").await;
        seed_comment(&db, post.id, None, false, 1).await;
        seed_comment(&db, post.id, None, false, 2).await;
        seed_comment(&db, post.id, None, true, 3).await;
        let foreign = seed_comment(&db, other.id, None, false, 4).await;

        assert_eq!(approve_post(&db, post.id).await.unwrap(), 2);
        assert_eq!(approve_post(&db, post.id).await.unwrap(), 0);
        assert!(!load_comment(&db, foreign.id).await.unwrap().is_approved);
    }
}
