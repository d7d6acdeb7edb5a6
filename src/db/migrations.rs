//! Database migrations
//!
//! Migrations are embedded SQL strings with one variant per driver. Applied
//! versions are tracked in the `_migrations` table, so running them is
//! idempotent.
//!
//! The schema is flat: users, blog posts, contact submissions, newsletter
//! subscribers and admin sessions have no foreign keys between them.

use anyhow::{Context, Result};
use sqlx::Row;

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique, ascending version number
    pub version: i32,
    pub name: &'static str,
    pub up_sqlite: &'static str,
    pub up_mysql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'user',
                created_at TIMESTAMP NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'user',
                created_at DATETIME NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_blog_posts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content TEXT NOT NULL,
                description TEXT NOT NULL,
                featured_image TEXT,
                category VARCHAR(255) NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                author VARCHAR(255) NOT NULL,
                seo_title TEXT,
                seo_description TEXT,
                seo_keywords TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_blog_posts_status ON blog_posts(status);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title TEXT NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content LONGTEXT NOT NULL,
                description TEXT NOT NULL,
                featured_image TEXT,
                category VARCHAR(255) NOT NULL,
                tags TEXT NOT NULL,
                author VARCHAR(255) NOT NULL,
                seo_title TEXT,
                seo_description TEXT,
                seo_keywords TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at DATETIME NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            );
            CREATE INDEX idx_blog_posts_status ON blog_posts(status);
        "#,
    },
    Migration {
        version: 3,
        name: "create_contacts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email VARCHAR(255) NOT NULL,
                interest_area VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name TEXT NOT NULL,
                email VARCHAR(255) NOT NULL,
                interest_area VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                created_at DATETIME NOT NULL
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_newsletters",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS newsletters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                created_at TIMESTAMP NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS newsletters (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name TEXT NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                created_at DATETIME NOT NULL
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at DATETIME NOT NULL,
                created_at DATETIME NOT NULL
            );
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
];

/// Apply every pending migration, returning how many ran.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;
    let mut count = 0;

    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }
        tracing::info!(
            "Applying migration {}: {}",
            migration.version,
            migration.name
        );
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Number of migrations not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = applied_versions(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .count())
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn applied_versions(pool: &DynDatabasePool) -> Result<Vec<i32>> {
    const QUERY: &str = "SELECT version FROM _migrations ORDER BY version";

    let versions = if let Some(sqlite) = pool.as_sqlite() {
        sqlx::query(QUERY)
            .fetch_all(sqlite)
            .await?
            .iter()
            .map(|row| row.try_get::<i32, _>("version"))
            .collect::<Result<Vec<_>, _>>()?
    } else if let Some(mysql) = pool.as_mysql() {
        sqlx::query(QUERY)
            .fetch_all(mysql)
            .await?
            .iter()
            .map(|row| row.try_get::<i32, _>("version"))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        anyhow::bail!("Unsupported database pool");
    };

    Ok(versions)
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => migration.up_sqlite,
        DatabaseDriver::Mysql => migration.up_mysql,
    };

    for statement in split_sql_statements(sql) {
        pool.execute(statement)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    let record = format!(
        "INSERT INTO _migrations (version, name) VALUES ({}, '{}')",
        migration.version, migration.name
    );
    pool.execute(&record).await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        let applied = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(applied, MIGRATIONS.len());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);

        let applied = run_migrations(&pool).await.expect("Failed to rerun migrations");
        assert_eq!(applied, 0);
    }

    #[tokio::test]
    async fn test_unique_slug_enforced() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let insert = "INSERT INTO blog_posts (title, slug, content, description, category, tags, author, status, created_at, updated_at) \
                      VALUES ('t', 'same-slug', 'c', 'd', 'cat', '[]', 'a', 'draft', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')";
        pool.execute(insert).await.expect("first insert");
        assert!(pool.execute(insert).await.is_err());
    }

    #[tokio::test]
    async fn test_unique_newsletter_email_enforced() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let insert = "INSERT INTO newsletters (name, email, created_at) VALUES ('A', 'a@b.co', '2024-01-01T00:00:00Z')";
        pool.execute(insert).await.expect("first insert");
        assert!(pool.execute(insert).await.is_err());
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        assert_eq!(split_sql_statements(sql).len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);\n-- trailing";
        assert_eq!(split_sql_statements(sql_with_comments).len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }

    #[test]
    fn test_truncate_sql() {
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
    }
}
