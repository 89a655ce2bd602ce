use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

use crate::auth::guard::Scope;
use crate::pagination::PageParams;

/// Invoice row joined with its customer and package.
#[derive(Debug, Clone, FromRow)]
pub struct TagihanRow {
    pub id: i64,
    pub tahun: i32,
    pub bulan: i32,
    pub tanggal_bayar: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub pelanggan_id: i64,
    pub nama_pelanggan: String,
    pub paket_id: i64,
    pub nama_paket: String,
    pub harga: i64,
    pub kecepatan: String,
}

/// Bare invoice row used by the yearly summary.
#[derive(Debug, Clone, FromRow)]
pub struct TagihanSummaryRow {
    pub id: i64,
    pub pelanggan_id: i64,
    pub paket_id: i64,
    pub tahun: i32,
    pub bulan: i32,
    pub tanggal_bayar: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct TagihanFilter {
    pub tahun: Option<i32>,
    pub bulan: Option<i32>,
    pub pelanggan_id: Option<i64>,
    pub paket_id: Option<i64>,
}

impl TagihanFilter {
    /// Applies the guard's visibility decision. A narrowed scope replaces any
    /// caller-supplied customer filter before the query is built, so a USER
    /// cannot widen their view through query parameters.
    pub fn scoped(mut self, scope: Scope) -> Self {
        if let Scope::Pelanggan(id) = scope {
            self.pelanggan_id = Some(id);
        }
        self
    }
}

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("tahun", "t.tahun"),
    ("bulan", "t.bulan"),
    ("tanggal_bayar", "t.tanggal_bayar"),
    ("created_at", "t.created_at"),
];

const BASE_SELECT: &str = r#"
    SELECT t.id, t.tahun, t.bulan, t.tanggal_bayar, t.created_at, t.updated_at,
           t.pelanggan_id,
           p.nama AS nama_pelanggan,
           t.paket_id,
           pk.nama AS nama_paket,
           pk.harga,
           pk.kecepatan
    FROM tagihan t
    JOIN pelanggan p ON t.pelanggan_id = p.id
    JOIN paket pk ON t.paket_id = pk.id
"#;

const FILTER_WHERE: &str = r#"
    WHERE ($1::int IS NULL OR t.tahun = $1)
      AND ($2::int IS NULL OR t.bulan = $2)
      AND ($3::bigint IS NULL OR t.pelanggan_id = $3)
      AND ($4::bigint IS NULL OR t.paket_id = $4)
"#;

pub async fn list(
    db: &PgPool,
    filter: &TagihanFilter,
    page: &PageParams,
) -> anyhow::Result<(Vec<TagihanRow>, i64)> {
    let order = page.order_by(SORT_COLUMNS, "t.tanggal_bayar", "DESC");
    let rows = sqlx::query_as::<_, TagihanRow>(&format!(
        "{BASE_SELECT} {FILTER_WHERE} ORDER BY {order} LIMIT $5 OFFSET $6"
    ))
    .bind(filter.tahun)
    .bind(filter.bulan)
    .bind(filter.pelanggan_id)
    .bind(filter.paket_id)
    .bind(page.size)
    .bind(page.offset())
    .fetch_all(db)
    .await?;

    let (total,): (i64,) = sqlx::query_as(&format!(
        r#"
        SELECT COUNT(*)
        FROM tagihan t
        JOIN pelanggan p ON t.pelanggan_id = p.id
        JOIN paket pk ON t.paket_id = pk.id
        {FILTER_WHERE}
        "#
    ))
    .bind(filter.tahun)
    .bind(filter.bulan)
    .bind(filter.pelanggan_id)
    .bind(filter.paket_id)
    .fetch_one(db)
    .await?;

    Ok((rows, total))
}

pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<TagihanRow>> {
    let row = sqlx::query_as::<_, TagihanRow>(&format!("{BASE_SELECT} WHERE t.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Inserts one invoice for a customer's billing period. A duplicate period
/// is skipped, not an error.
pub async fn create(
    db: &PgPool,
    pelanggan_id: i64,
    paket_id: i64,
    tahun: i32,
    bulan: i32,
    tanggal_bayar: Date,
) -> anyhow::Result<Option<i64>> {
    let id: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO tagihan (pelanggan_id, paket_id, tahun, bulan, tanggal_bayar)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (pelanggan_id, tahun, bulan) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(pelanggan_id)
    .bind(paket_id)
    .bind(tahun)
    .bind(bulan)
    .bind(tanggal_bayar)
    .fetch_optional(db)
    .await?;
    Ok(id.map(|(id,)| id))
}

pub async fn update(
    db: &PgPool,
    id: i64,
    pelanggan_id: i64,
    paket_id: i64,
    tahun: i32,
    bulan: i32,
    tanggal_bayar: Date,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE tagihan
        SET pelanggan_id = $1, paket_id = $2, tahun = $3, bulan = $4,
            tanggal_bayar = $5, updated_at = now()
        WHERE id = $6
        "#,
    )
    .bind(pelanggan_id)
    .bind(paket_id)
    .bind(tahun)
    .bind(bulan)
    .bind(tanggal_bayar)
    .bind(id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM tagihan WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Yearly summary rows, optionally narrowed to one customer. The scope lands
/// in the predicate, never in post-filtering.
pub async fn summary(
    db: &PgPool,
    tahun: i32,
    scope: Scope,
) -> anyhow::Result<Vec<TagihanSummaryRow>> {
    let pelanggan_id = match scope {
        Scope::All => None,
        Scope::Pelanggan(id) => Some(id),
    };
    let rows = sqlx::query_as::<_, TagihanSummaryRow>(
        r#"
        SELECT id, pelanggan_id, paket_id, tahun, bulan, tanggal_bayar, created_at, updated_at
        FROM tagihan
        WHERE tahun = $1
          AND ($2::bigint IS NULL OR pelanggan_id = $2)
        ORDER BY bulan, pelanggan_id
        "#,
    )
    .bind(tahun)
    .bind(pelanggan_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowed_scope_overrides_requested_customer_filter() {
        let filter = TagihanFilter {
            tahun: Some(2025),
            bulan: None,
            pelanggan_id: Some(99), // hostile filter aimed at another customer
            paket_id: None,
        };
        let scoped = filter.scoped(Scope::Pelanggan(7));
        assert_eq!(scoped.pelanggan_id, Some(7));
        assert_eq!(scoped.tahun, Some(2025));
    }

    #[test]
    fn full_scope_keeps_requested_filter() {
        let filter = TagihanFilter {
            pelanggan_id: Some(99),
            ..Default::default()
        };
        let scoped = filter.scoped(Scope::All);
        assert_eq!(scoped.pelanggan_id, Some(99));
    }
}
