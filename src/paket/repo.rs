use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::pagination::PageParams;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Paket {
    pub id: i64,
    pub nama: String,
    pub harga: i64,
    pub kecepatan: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct PaketFilter {
    pub nama: Option<String>,
    pub kecepatan: Option<String>,
}

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("nama", "nama"),
    ("harga", "harga"),
    ("kecepatan", "kecepatan"),
    ("created_at", "created_at"),
];

const FILTER_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR nama ILIKE '%' || $1 || '%')
      AND ($2::text IS NULL OR kecepatan ILIKE '%' || $2 || '%')
"#;

pub async fn list(
    db: &PgPool,
    filter: &PaketFilter,
    page: &PageParams,
) -> anyhow::Result<(Vec<Paket>, i64)> {
    let order = page.order_by(SORT_COLUMNS, "nama", "ASC");
    let rows = sqlx::query_as::<_, Paket>(&format!(
        r#"
        SELECT id, nama, harga, kecepatan, created_at, updated_at
        FROM paket
        {FILTER_WHERE}
        ORDER BY {order}
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(&filter.nama)
    .bind(&filter.kecepatan)
    .bind(page.size)
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    let (total,): (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM paket {FILTER_WHERE}"))
            .bind(&filter.nama)
            .bind(&filter.kecepatan)
            .fetch_one(db)
            .await?;

    Ok((rows, total))
}

pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<Paket>> {
    let paket = sqlx::query_as::<_, Paket>(
        r#"
        SELECT id, nama, harga, kecepatan, created_at, updated_at
        FROM paket
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(paket)
}

pub async fn create(
    db: &PgPool,
    nama: &str,
    harga: i64,
    kecepatan: &str,
) -> anyhow::Result<Paket> {
    let paket = sqlx::query_as::<_, Paket>(
        r#"
        INSERT INTO paket (nama, harga, kecepatan)
        VALUES ($1, $2, $3)
        RETURNING id, nama, harga, kecepatan, created_at, updated_at
        "#,
    )
    .bind(nama)
    .bind(harga)
    .bind(kecepatan)
    .fetch_one(db)
    .await?;
    Ok(paket)
}

pub async fn update(
    db: &PgPool,
    id: i64,
    nama: &str,
    harga: i64,
    kecepatan: &str,
) -> anyhow::Result<Option<Paket>> {
    let paket = sqlx::query_as::<_, Paket>(
        r#"
        UPDATE paket
        SET nama = $1, harga = $2, kecepatan = $3, updated_at = now()
        WHERE id = $4
        RETURNING id, nama, harga, kecepatan, created_at, updated_at
        "#,
    )
    .bind(nama)
    .bind(harga)
    .bind(kecepatan)
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(paket)
}

pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM paket WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
