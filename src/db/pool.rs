//! Database connection pool

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create a new database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await
}

/// Split SQL into statements, properly handling $$ delimited blocks (PL/pgSQL)
///
/// `--` comments outside dollar blocks and string literals are dropped, so a
/// semicolon inside a comment never ends a statement.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_dollar_block = false;
    let mut in_string = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if !in_dollar_block && !in_string && c == '-' && chars.peek() == Some(&'-') {
            for skipped in chars.by_ref() {
                if skipped == '\n' {
                    current.push('\n');
                    break;
                }
            }
            continue;
        }

        current.push(c);

        if in_string {
            if c == '\'' {
                in_string = false;
            }
        } else if c == '$' && chars.peek() == Some(&'$') {
            if let Some(next) = chars.next() {
                current.push(next);
            }
            in_dollar_block = !in_dollar_block;
        } else if c == '\'' && !in_dollar_block {
            in_string = true;
        } else if c == ';' && !in_dollar_block {
            if has_sql_content(&current) {
                statements.push(current.trim().to_string());
            }
            current.clear();
        }
    }

    if has_sql_content(&current) {
        statements.push(current.trim().to_string());
    }

    statements
}

/// Check if a string has actual SQL content (not just comments)
fn has_sql_content(s: &str) -> bool {
    s.lines().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with("--")
    })
}

/// Run database migrations
///
/// Every statement is written to be re-runnable, so any failure means the
/// schema is broken and startup stops with that error.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migration_sql = include_str!("migrations/001_initial.sql");

    let statements = split_sql_statements(migration_sql);
    let total = statements.len();

    for (index, statement) in statements.iter().enumerate() {
        if let Err(e) = sqlx::query(statement).execute(pool).await {
            tracing::error!(
                "Migration statement {} of {} failed: {}\n{}",
                index + 1,
                total,
                e,
                statement
            );
            return Err(e);
        }
    }

    tracing::info!("Database migrations completed ({} statements)", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_dollar_blocks() {
        let sql = r#"
            -- enum
            DO $$ BEGIN
                CREATE TYPE quote_status AS ENUM ('Draft');
            EXCEPTION WHEN duplicate_object THEN NULL;
            END $$;

            CREATE TABLE IF NOT EXISTS a (id INT);
            -- trailing comment only
        "#;

        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("duplicate_object"));
        assert!(statements[0].ends_with("END $$;"));
        assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS a"));
    }

    #[test]
    fn test_semicolon_in_comment_does_not_split() {
        let sql = "-- schema; re-applied on start\nDO $$ BEGIN NULL; END $$;\n\
                   CREATE TABLE IF NOT EXISTS a (id INT); -- done; really\n\
                   CREATE TABLE IF NOT EXISTS b (note TEXT DEFAULT '-- not a comment;');";

        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0], "DO $$ BEGIN NULL; END $$;");
        assert_eq!(statements[1], "CREATE TABLE IF NOT EXISTS a (id INT);");
        assert!(statements[2].ends_with("DEFAULT '-- not a comment;');"));
    }

    #[test]
    fn test_embedded_migration_splits_cleanly() {
        let statements = split_sql_statements(include_str!("migrations/001_initial.sql"));
        assert!(statements.len() > 10);
        assert!(statements[0].starts_with("DO $$"));
        assert!(statements[0].contains("CREATE TYPE quote_status"));

        for statement in &statements {
            assert!(
                ["CREATE ", "DO ", "DROP ", "ALTER "]
                    .iter()
                    .any(|keyword| statement.starts_with(keyword)),
                "unexpected statement start: {}",
                statement
            );
        }

        for table in ["quotes", "quote_items", "contracts", "profiles", "tickets"] {
            let create = format!("CREATE TABLE IF NOT EXISTS {} (", table);
            assert!(
                statements.iter().any(|s| s.starts_with(&create)),
                "missing table {}",
                table
            );
        }
    }
}
