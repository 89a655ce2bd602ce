use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, OffsetDateTime};

use crate::error::ApiError;
use crate::ids::IdCodec;
use crate::pagination::PageParams;
use crate::tagihan::repo::{TagihanRow, TagihanSummaryRow};

fn default_page() -> i64 {
    1
}
fn default_size() -> i64 {
    10
}

/// Query parameters for `GET /tagihan`. The customer/package filters take
/// raw internal ids; for USER callers the guard's scope wins over
/// `pelanggan_id` regardless of what is requested.
#[derive(Debug, Deserialize)]
pub struct TagihanListParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub tahun: Option<i32>,
    pub bulan: Option<i32>,
    pub pelanggan_id: Option<i64>,
    pub paket_id: Option<i64>,
}

impl TagihanListParams {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort: self.sort.clone(),
            direction: self.direction.clone(),
        }
    }
}

/// Request body for creating or replacing a tagihan. The customer and
/// package references arrive as opaque id strings (surface contract), unlike
/// the raw integer references in package/customer bodies.
#[derive(Debug, Deserialize)]
pub struct TagihanPostRequest {
    pub pelanggan_id: String,
    pub paket_id: String,
    pub tahun: i32,
    pub bulan: i32,
    pub tanggal_bayar: String,
}

impl TagihanPostRequest {
    pub fn parse_tanggal_bayar(&self) -> Result<Date, ApiError> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(&self.tanggal_bayar, &format)
            .map_err(|_| ApiError::Validation("tanggal_bayar must be YYYY-MM-DD".into()))
    }
}

#[derive(Debug, Serialize)]
pub struct PelangganMini {
    pub id: String,
    pub nama: String,
}

#[derive(Debug, Serialize)]
pub struct PaketMini {
    pub id: String,
    pub nama: String,
    pub harga: i64,
    pub kecepatan: String,
}

#[derive(Debug, Serialize)]
pub struct TagihanResponse {
    pub id: String,
    pub pelanggan: PelangganMini,
    pub paket: PaketMini,
    pub tahun: i32,
    pub bulan: i32,
    pub tanggal_bayar: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TagihanResponse {
    pub fn from_row(row: TagihanRow, codec: &IdCodec) -> Result<Self, ApiError> {
        let encode =
            |id: i64| codec.encode(id).map_err(|e| ApiError::Internal(e.into()));
        Ok(Self {
            id: encode(row.id)?,
            pelanggan: PelangganMini {
                id: encode(row.pelanggan_id)?,
                nama: row.nama_pelanggan,
            },
            paket: PaketMini {
                id: encode(row.paket_id)?,
                nama: row.nama_paket,
                harga: row.harga,
                kecepatan: row.kecepatan,
            },
            tahun: row.tahun,
            bulan: row.bulan,
            tanggal_bayar: row.tanggal_bayar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TagihanSummaryItem {
    pub id: String,
    pub pelanggan_id: String,
    pub paket_id: String,
    pub tahun: i32,
    pub bulan: i32,
    pub tanggal_bayar: Date,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TagihanSummaryItem {
    pub fn from_row(row: TagihanSummaryRow, codec: &IdCodec) -> Result<Self, ApiError> {
        let encode =
            |id: i64| codec.encode(id).map_err(|e| ApiError::Internal(e.into()));
        Ok(Self {
            id: encode(row.id)?,
            pelanggan_id: encode(row.pelanggan_id)?,
            paket_id: encode(row.paket_id)?,
            tahun: row.tahun,
            bulan: row.bulan,
            tanggal_bayar: row.tanggal_bayar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_request(date: &str) -> TagihanPostRequest {
        TagihanPostRequest {
            pelanggan_id: "x".into(),
            paket_id: "y".into(),
            tahun: 2025,
            bulan: 3,
            tanggal_bayar: date.into(),
        }
    }

    #[test]
    fn parses_iso_payment_date() {
        let date = post_request("2025-03-14").parse_tanggal_bayar().expect("parse");
        assert_eq!((date.year(), date.month() as u8, date.day()), (2025, 3, 14));
    }

    #[test]
    fn rejects_malformed_payment_date() {
        for bad in ["14-03-2025", "2025/03/14", "yesterday", ""] {
            assert!(matches!(
                post_request(bad).parse_tanggal_bayar(),
                Err(ApiError::Validation(_))
            ));
        }
    }
}
