use log::debug;
use sea_orm::{DatabaseConnection, TransactionTrait};

use super::store;
use crate::entity::comment;
use crate::error::{tx_error, AppError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub replies_removed: u64,
    pub likes_removed: u64,
}

/// Deletes a comment, its direct replies and the likes on the comment itself,
/// all in one transaction, and returns the comment as it was before deletion.
///
/// Deeper replies and likes on the removed replies are left in place.
pub async fn delete_comment(
    db: &DatabaseConnection,
    comment_id: i32,
) -> Result<(comment::Model, DeleteReport), AppError> {
    let (snapshot, report) = db
        .transaction::<_, (comment::Model, DeleteReport), AppError>(|txn| {
            Box::pin(async move {
                let snapshot = store::find_comment(txn, comment_id)
                    .await?
                    .ok_or(AppError::NotFound("comment"))?;
                store::delete_comment(txn, comment_id).await?;
                let replies_removed = store::delete_children(txn, comment_id).await?;
                let likes_removed = store::delete_likes_of(txn, comment_id).await?;
                Ok((snapshot, DeleteReport { replies_removed, likes_removed }))
            })
        })
        .await
        .map_err(tx_error("delete_comment"))?;

    debug!(
        "comment deleted id={} replies_removed={} likes_removed={}",
        comment_id, report.replies_removed, report.likes_removed
    );
    Ok((snapshot, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::like::toggle_like;
    use crate::test_support::*;

    #[actix_rt::test]
    async fn removes_target_direct_replies_and_its_likes_only() {
        let db = setup_db().await;
        let post = seed_post(&db, "p").await;
        let a = seed_comment(&db, post.id, None, true, 1).await;
        let b = seed_comment(&db, post.id, Some(a.id), true, 2).await;
        let c = seed_comment(&db, post.id, Some(b.id), true, 3).await;
        let sibling = seed_comment(&db, post.id, None, true, 4).await;
        toggle_like(&db, a.id, 10).await.unwrap();
        toggle_like(&db, b.id, 10).await.unwrap();

        let (snapshot, report) = delete_comment(&db, a.id).await.unwrap();

        assert_eq!(snapshot.id, a.id);
        assert_eq!(snapshot.content, a.content);
        assert_eq!(snapshot.likes, 1);
        assert_eq!(report, DeleteReport { replies_removed: 1, likes_removed: 1 });
        assert!(load_comment(&db, a.id).await.is_none());
        assert!(load_comment(&db, b.id).await.is_none());
        assert_eq!(like_rows(&db, a.id).await, 0);

        // the cascade is one level deep: the grandchild and the like on the
        // removed reply stay behind as orphans
        assert!(load_comment(&db, c.id).await.is_some());
        assert_eq!(like_rows(&db, b.id).await, 1);
        assert!(load_comment(&db, sibling.id).await.is_some());
    }

    #[actix_rt::test]
    async fn missing_comment_is_not_found() {
        let db = setup_db().await;
        let post = seed_post(&db, "p").await;
        seed_comment(&db, post.id, None, true, 1).await;

        let err = delete_comment(&db, 999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("comment")));
        assert_eq!(comment_rows(&db).await, 1);
    }

    #[actix_rt::test]
    async fn failure_in_the_last_step_keeps_everything() {
        let db = setup_db().await;
        let post = seed_post(&db, "p").await;
        let a = seed_comment(&db, post.id, None, true, 1).await;
        let b = seed_comment(&db, post.id, Some(a.id), true, 2).await;
        toggle_like(&db, a.id, 10).await.unwrap();
        exec(
            &db,
            "CREATE TRIGGER keep_likes BEFORE DELETE ON t_comment_like \
             BEGIN SELECT RAISE(ABORT, 'likes locked'); END",
        )
        .await;

        let err = delete_comment(&db, a.id).await.unwrap_err();
        match err {
            AppError::TransactionFailed { op, step, .. } => {
                assert_eq!(op, "delete_comment");
                assert_eq!(step, "delete likes");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(load_comment(&db, a.id).await.is_some());
        assert!(load_comment(&db, b.id).await.is_some());
        assert_eq!(like_rows(&db, a.id).await, 1);
        assert_eq!(comment_rows(&db).await, 2);
    }
}
