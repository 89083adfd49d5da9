use chrono::Utc;
use log::debug;
use sea_orm::{DatabaseConnection, TransactionTrait};

use super::store;
use crate::entity::comment;
use crate::error::{tx_error, AppError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Flips whether `user_id` likes `comment_id` and keeps `likes` equal to the
/// number of like rows. Runs as one transaction; a write conflict surfaces as
/// `TransactionFailed` and is not retried here.
pub async fn toggle_like(
    db: &DatabaseConnection,
    comment_id: i32,
    user_id: i32,
) -> Result<(ToggleOutcome, comment::Model), AppError> {
    let result = db
        .transaction::<_, (ToggleOutcome, comment::Model), AppError>(|txn| {
            Box::pin(async move {
                store::find_comment(txn, comment_id)
                    .await?
                    .ok_or(AppError::NotFound("comment"))?;

                let outcome = match store::find_like(txn, comment_id, user_id).await? {
                    None => {
                        store::insert_like(txn, comment_id, user_id, Utc::now()).await?;
                        store::increment_likes(txn, comment_id).await?;
                        ToggleOutcome::Added
                    }
                    Some(like) => {
                        store::delete_like(txn, like.id).await?;
                        store::decrement_likes(txn, comment_id).await?;
                        ToggleOutcome::Removed
                    }
                };

                let updated = store::find_comment(txn, comment_id)
                    .await?
                    .ok_or(AppError::NotFound("comment"))?;
                Ok((outcome, updated))
            })
        })
        .await
        .map_err(tx_error("toggle_like"))?;

    debug!(
        "like toggled comment={} user={} outcome={:?} likes={}",
        comment_id, user_id, result.0, result.1.likes
    );
    Ok(result)
}
