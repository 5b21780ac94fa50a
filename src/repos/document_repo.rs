/*
 * Responsibility
 * - documents テーブル向け SQLx 操作 (collection + JSONB body)
 * - PgPool を受け取り CRUD を提供
 * - owner 条件付きの更新/削除は 1 文で行う (確認と更新の間に隙間を作らない)
 */
use sqlx::{FromRow, PgPool, types::Json};

use crate::repos::error::RepoError;
use crate::schema::{Document, OWNER_FIELD};

#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub body: Json<Document>,
}

pub async fn insert(db: &PgPool, collection: &str, body: &Document) -> Result<DocumentRow, RepoError> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        INSERT INTO documents (collection, body)
        VALUES ($1, $2)
        RETURNING id, body
        "#,
    )
    .bind(collection)
    .bind(Json(body))
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn get(db: &PgPool, collection: &str, id: i64) -> Result<Option<DocumentRow>, RepoError> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, body
        FROM documents
        WHERE collection = $1 AND id = $2
        "#,
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// `filter` is matched by JSONB containment; `sort_field` orders by the field's JSONB value.
pub async fn find(
    db: &PgPool,
    collection: &str,
    filter: &Document,
    sort_field: &str,
    descending: bool,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<DocumentRow>, RepoError> {
    // ORDER BY の向きは bind できないので SQL を分ける
    let sql = if descending {
        r#"
        SELECT id, body
        FROM documents
        WHERE collection = $1 AND body @> $2
        ORDER BY body -> $3 DESC NULLS LAST, id DESC
        LIMIT $4 OFFSET $5
        "#
    } else {
        r#"
        SELECT id, body
        FROM documents
        WHERE collection = $1 AND body @> $2
        ORDER BY body -> $3 ASC NULLS FIRST, id ASC
        LIMIT $4 OFFSET $5
        "#
    };

    let rows = sqlx::query_as::<_, DocumentRow>(sql)
        .bind(collection)
        .bind(Json(filter))
        .bind(sort_field)
        .bind(limit) // NULL = no limit
        .bind(offset)
        .fetch_all(db)
        .await?;

    Ok(rows)
}

pub async fn replace_owned(
    db: &PgPool,
    collection: &str,
    id: i64,
    owner: &str,
    body: &Document,
) -> Result<Option<DocumentRow>, RepoError> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        UPDATE documents
        SET body = $4
        WHERE collection = $1 AND id = $2 AND body ->> $5 = $3
        RETURNING id, body
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(owner)
    .bind(Json(body))
    .bind(OWNER_FIELD)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn patch_owned(
    db: &PgPool,
    collection: &str,
    id: i64,
    owner: &str,
    changes: &Document,
) -> Result<Option<DocumentRow>, RepoError> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        UPDATE documents
        SET body = body || $4
        WHERE collection = $1 AND id = $2 AND body ->> $5 = $3
        RETURNING id, body
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(owner)
    .bind(Json(changes))
    .bind(OWNER_FIELD)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete_owned(db: &PgPool, collection: &str, id: i64, owner: &str) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM documents
        WHERE collection = $1 AND id = $2 AND body ->> $4 = $3
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(owner)
    .bind(OWNER_FIELD)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Runs against the database named by `DATABASE_URL` and is skipped when it is unset.
/// Each test writes to its own collection, so the suite can share one database.
#[cfg(test)]
pub(crate) mod test_db {
    use sqlx::{PgPool, postgres::PgPoolOptions};

    pub async fn pool() -> Option<PgPool> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL is not set; skipping postgres test");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("run migrations");

        Some(pool)
    }

    pub fn collection(name: &str) -> String {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        format!("test_{}_{}", name, nanos)
    }
}
