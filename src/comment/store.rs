//! Typed access to `t_comment` and `t_comment_like`.
//!
//! Every function is generic over [`ConnectionTrait`] so the same call works on
//! the pooled connection and inside a transaction. Store errors leave this
//! module already tagged with the step that failed.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect, Set, Statement,
};

use super::model::{CommentSort, SortField, SortOrder};
use crate::entity::{comment, comment_like, post};
use crate::error::{store, AppError};

pub async fn find_post_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<post::Model>, AppError> {
    post::Entity::find()
        .filter(post::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(store("find post"))
}

pub async fn find_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<comment::Model>, AppError> {
    comment::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(store("find comment"))
}

pub async fn list_approved<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    sort: CommentSort,
    offset: u64,
    limit: u64,
) -> Result<Vec<comment::Model>, AppError> {
    let order = match sort.order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    let column = match sort.field {
        SortField::CreatedAt => comment::Column::CreatedAt,
        SortField::Likes => comment::Column::Likes,
    };
    comment::Entity::find()
        .filter(comment::Column::PostId.eq(post_id))
        .filter(comment::Column::IsApproved.eq(true))
        .order_by(column, order.clone())
        .order_by(comment::Column::Id, order)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await
        .map_err(store("list approved comments"))
}

pub async fn list_pending<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    offset: u64,
    limit: u64,
) -> Result<Vec<comment::Model>, AppError> {
    comment::Entity::find()
        .filter(comment::Column::PostId.eq(post_id))
        .filter(comment::Column::IsApproved.eq(false))
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await
        .map_err(store("list pending comments"))
}

pub async fn insert_comment<C: ConnectionTrait>(
    db: &C,
    model: comment::ActiveModel,
) -> Result<comment::Model, AppError> {
    model.insert(db).await.map_err(store("insert comment"))
}

pub async fn mark_approved<C: ConnectionTrait>(
    db: &C,
    model: comment::Model,
    now: DateTime<Utc>,
) -> Result<comment::Model, AppError> {
    let mut active: comment::ActiveModel = model.into();
    active.is_approved = Set(true);
    active.updated_at = Set(now);
    active.update(db).await.map_err(store("approve comment"))
}

pub async fn mark_post_approved<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    now: DateTime<Utc>,
) -> Result<u64, AppError> {
    let result = comment::Entity::update_many()
        .col_expr(comment::Column::IsApproved, Expr::value(true))
        .col_expr(comment::Column::UpdatedAt, Expr::value(now))
        .filter(comment::Column::PostId.eq(post_id))
        .filter(comment::Column::IsApproved.eq(false))
        .exec(db)
        .await
        .map_err(store("approve post comments"))?;
    Ok(result.rows_affected)
}

pub async fn find_like<C: ConnectionTrait>(
    db: &C,
    comment_id: i32,
    user_id: i32,
) -> Result<Option<comment_like::Model>, AppError> {
    comment_like::Entity::find()
        .filter(comment_like::Column::CommentId.eq(comment_id))
        .filter(comment_like::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(store("find like"))
}

pub async fn insert_like<C: ConnectionTrait>(
    db: &C,
    comment_id: i32,
    user_id: i32,
    now: DateTime<Utc>,
) -> Result<comment_like::Model, AppError> {
    comment_like::ActiveModel {
        comment_id: Set(comment_id),
        user_id: Set(user_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(store("insert like"))
}

pub async fn delete_like<C: ConnectionTrait>(db: &C, like_id: i32) -> Result<u64, AppError> {
    let result = comment_like::Entity::delete_by_id(like_id)
        .exec(db)
        .await
        .map_err(store("delete like"))?;
    Ok(result.rows_affected)
}

pub async fn increment_likes<C: ConnectionTrait>(db: &C, comment_id: i32) -> Result<(), AppError> {
    exec_sql(
        db,
        "update t_comment set likes = likes + 1 where id = ?",
        vec![comment_id.into()],
        "increment likes",
    )
    .await
}

pub async fn decrement_likes<C: ConnectionTrait>(db: &C, comment_id: i32) -> Result<(), AppError> {
    exec_sql(
        db,
        "update t_comment set likes = likes - 1 where id = ? and likes >= 1",
        vec![comment_id.into()],
        "decrement likes",
    )
    .await
}

pub async fn delete_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<u64, AppError> {
    let result = comment::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(store("delete comment"))?;
    Ok(result.rows_affected)
}

/// Removes the direct replies of `parent_id` only.
pub async fn delete_children<C: ConnectionTrait>(db: &C, parent_id: i32) -> Result<u64, AppError> {
    let result = comment::Entity::delete_many()
        .filter(comment::Column::ParentId.eq(parent_id))
        .exec(db)
        .await
        .map_err(store("delete replies"))?;
    Ok(result.rows_affected)
}

pub async fn delete_likes_of<C: ConnectionTrait>(db: &C, comment_id: i32) -> Result<u64, AppError> {
    let result = comment_like::Entity::delete_many()
        .filter(comment_like::Column::CommentId.eq(comment_id))
        .exec(db)
        .await
        .map_err(store("delete likes"))?;
    Ok(result.rows_affected)
}

async fn exec_sql<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    values: Vec<sea_orm::Value>,
    step: &'static str,
) -> Result<(), AppError> {
    let backend = db.get_database_backend();
    let stmt = Statement::from_sql_and_values(backend, sql, values);
    db.execute(stmt).await.map_err(store(step))?;
    Ok(())
}
