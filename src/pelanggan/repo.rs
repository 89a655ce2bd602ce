use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::pagination::PageParams;

/// Customer row joined with its package, mirroring the list/detail SELECT.
#[derive(Debug, Clone, FromRow)]
pub struct PelangganRow {
    pub id: i64,
    pub nama: String,
    pub alamat: String,
    pub no_hp: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub paket_id: i64,
    pub nama_paket: String,
    pub harga: i64,
    pub kecepatan: String,
    pub paket_created_at: OffsetDateTime,
    pub paket_updated_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct PelangganFilter {
    pub nama: Option<String>,
    pub paket_id: Option<i64>,
}

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("nama", "p.nama"),
    ("alamat", "p.alamat"),
    ("created_at", "p.created_at"),
];

const BASE_SELECT: &str = r#"
    SELECT p.id, p.nama, p.alamat, p.no_hp, p.created_at, p.updated_at,
           p.paket_id,
           pk.nama AS nama_paket,
           pk.harga,
           pk.kecepatan,
           pk.created_at AS paket_created_at,
           pk.updated_at AS paket_updated_at
    FROM pelanggan p
    JOIN paket pk ON p.paket_id = pk.id
"#;

const FILTER_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR p.nama ILIKE '%' || $1 || '%')
      AND ($2::bigint IS NULL OR p.paket_id = $2)
"#;

pub async fn list(
    db: &PgPool,
    filter: &PelangganFilter,
    page: &PageParams,
) -> anyhow::Result<(Vec<PelangganRow>, i64)> {
    let order = page.order_by(SORT_COLUMNS, "p.nama", "ASC");
    let rows = sqlx::query_as::<_, PelangganRow>(&format!(
        "{BASE_SELECT} {FILTER_WHERE} ORDER BY {order} LIMIT $3 OFFSET $4"
    ))
    .bind(&filter.nama)
    .bind(filter.paket_id)
    .bind(page.size)
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    let (total,): (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM pelanggan p {FILTER_WHERE}"))
            .bind(&filter.nama)
            .bind(filter.paket_id)
            .fetch_one(db)
            .await?;

    Ok((rows, total))
}

pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<PelangganRow>> {
    let row = sqlx::query_as::<_, PelangganRow>(&format!("{BASE_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    nama: &str,
    alamat: &str,
    no_hp: &str,
    paket_id: i64,
) -> anyhow::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO pelanggan (nama, alamat, no_hp, paket_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(nama)
    .bind(alamat)
    .bind(no_hp)
    .bind(paket_id)
    .fetch_one(db)
    .await?;
    Ok(id)
}

pub async fn update(
    db: &PgPool,
    id: i64,
    nama: &str,
    alamat: &str,
    no_hp: &str,
    paket_id: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE pelanggan
        SET nama = $1, alamat = $2, no_hp = $3, paket_id = $4, updated_at = now()
        WHERE id = $5
        "#,
    )
    .bind(nama)
    .bind(alamat)
    .bind(no_hp)
    .bind(paket_id)
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM pelanggan WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
