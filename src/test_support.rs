use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, Statement,
};

use crate::auth::{AuthUser, Role};
use crate::config::AppConfig;
use crate::comment::CommentService;
use crate::db::init_sqlite_schema;
use crate::entity::{comment, comment_like, post};

/// A fresh in-memory database. One pooled connection keeps every query on the
/// same sqlite memory instance.
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    init_sqlite_schema(&db).await.unwrap();
    db
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server_port: 0,
        sqlite_path: String::new(),
        database_url: Some("sqlite::memory:".to_string()),
        jwt_secret: "test-secret".to_string(),
        token_header: "token".to_string(),
        store_timeout_ms: 5000,
        page_size_max: 100,
        cors_allow_origin: "*".to_string(),
    }
}

pub fn service(db: &DatabaseConnection) -> CommentService {
    let cfg = test_config();
    CommentService::new(db.clone(), cfg.store_timeout(), cfg.page_size_max)
}

pub fn admin() -> AuthUser {
    AuthUser { user_id: 1, role: Role::Admin }
}

pub fn reader(user_id: i32) -> AuthUser {
    AuthUser { user_id, role: Role::User }
}

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minute)
}

pub async fn seed_post(db: &DatabaseConnection, name: &str) -> post::Model {
    post::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(at(0)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Inserts a comment created `minute` minutes after a fixed epoch.
pub async fn seed_comment(
    db: &DatabaseConnection,
    post_id: i32,
    parent_id: Option<i32>,
    approved: bool,
    minute: i64,
) -> comment::Model {
    comment::ActiveModel {
        post_id: Set(post_id),
        parent_id: Set(parent_id),
        content: Set(format!("comment at {minute}")),
        author_id: Set(None),
        author_name: Set("guest".to_string()),
        author_email: Set("guest@example.com".to_string()),
        author_website: Set(None),
        is_approved: Set(approved),
        likes: Set(0),
        created_at: Set(at(minute)),
        updated_at: Set(at(minute)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn load_comment(db: &DatabaseConnection, id: i32) -> Option<comment::Model> {
    comment::Entity::find_by_id(id).one(db).await.unwrap()
}

pub async fn like_rows(db: &DatabaseConnection, comment_id: i32) -> u64 {
    comment_like::Entity::find()
        .filter(comment_like::Column::CommentId.eq(comment_id))
        .count(db)
        .await
        .unwrap()
}

pub async fn comment_rows(db: &DatabaseConnection) -> u64 {
    comment::Entity::find().count(db).await.unwrap()
}

/// Runs raw DDL, e.g. a trigger that makes one write step fail.
pub async fn exec(db: &DatabaseConnection, sql: &str) {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_string()))
        .await
        .unwrap();
}
