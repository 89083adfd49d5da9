use log::{info, warn};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::config::AppConfig;

pub async fn connect_db(config: &AppConfig) -> DatabaseConnection {
    let url = config.database_url();
    if url.starts_with("sqlite:") {
        ensure_sqlite_path(&url);
    }
    let db = Database::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("db connect failed: {}", e));
    if db.get_database_backend() == DatabaseBackend::Sqlite {
        init_sqlite_schema(&db)
            .await
            .unwrap_or_else(|e| panic!("schema init failed: {}", e));
    }
    db
}

fn ensure_sqlite_path(raw: &str) {
    let path = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw);
    if path.contains(":memory:") {
        return;
    }
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("cannot create sqlite directory {}: {}", parent.display(), e);
        }
    }
    if let Err(e) = OpenOptions::new().create(true).write(true).open(path) {
        warn!("cannot create sqlite file {}: {}", path.display(), e);
    }
}

pub async fn init_sqlite_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let exists_stmt = Statement::from_string(
        backend,
        "SELECT name FROM sqlite_master WHERE type='table' AND name='t_comment' LIMIT 1",
    );
    if db.query_one(exists_stmt).await?.is_some() {
        return Ok(());
    }

    let sql = include_str!("../changelog-sqlite.sql");
    let statements = split_sql(sql);
    for stmt in &statements {
        db.execute(Statement::from_string(backend, stmt.clone())).await?;
    }
    info!("sqlite schema initialised ({} statements)", statements.len());
    Ok(())
}

fn split_sql(input: &str) -> Vec<String> {
    let mut buf = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }
        buf.push_str(line);
        buf.push('\n');
    }
    buf.split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sql_drops_comments_and_blank_statements() {
        let sql = "-- header\nCREATE TABLE a (id INTEGER);\n\n  -- note\nCREATE INDEX i ON a (id);\n;";
        let stmts = split_sql(sql);
        assert_eq!(stmts, vec!["CREATE TABLE a (id INTEGER)", "CREATE INDEX i ON a (id)"]);
    }

    #[test]
    fn bundled_schema_declares_every_table() {
        let stmts = split_sql(include_str!("../changelog-sqlite.sql"));
        for table in ["t_post", "t_user", "t_comment", "t_comment_like"] {
            assert!(
                stmts.iter().any(|s| s.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table))),
                "missing {}",
                table
            );
        }
        assert!(stmts.iter().any(|s| s.starts_with("CREATE UNIQUE INDEX") && s.contains("t_comment_like")));
    }

    #[test]
    fn unwritable_sqlite_path_is_reported_not_fatal() {
        ensure_sqlite_path("sqlite:///proc/comment-service/missing/data.sqlite");
        ensure_sqlite_path("sqlite::memory:");
    }

    #[actix_rt::test]
    async fn schema_init_is_idempotent() {
        let db = crate::test_support::setup_db().await;
        init_sqlite_schema(&db).await.unwrap();
    }
}
