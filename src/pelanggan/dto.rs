use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::ids::IdCodec;
use crate::pagination::PageParams;
use crate::pelanggan::repo::PelangganRow;

fn default_page() -> i64 {
    1
}
fn default_size() -> i64 {
    10
}

/// Query parameters for `GET /pelanggan`.
#[derive(Debug, Deserialize)]
pub struct PelangganListParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub nama: Option<String>,
    pub paket_id: Option<i64>,
}

impl PelangganListParams {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort: self.sort.clone(),
            direction: self.direction.clone(),
        }
    }
}

/// Request body for creating or replacing a pelanggan. The package reference
/// is a raw internal id; opaque encoding applies only at the response
/// boundary and in invoice bodies.
#[derive(Debug, Deserialize)]
pub struct PelangganPostRequest {
    pub nama: String,
    pub alamat: String,
    pub no_hp: String,
    pub paket_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PaketEmbed {
    pub id: String,
    pub nama: String,
    pub harga: i64,
    pub kecepatan: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct PelangganResponse {
    pub id: String,
    pub nama: String,
    pub alamat: String,
    pub no_hp: String,
    pub paket: PaketEmbed,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PelangganResponse {
    pub fn from_row(row: PelangganRow, codec: &IdCodec) -> Result<Self, ApiError> {
        let encode =
            |id: i64| codec.encode(id).map_err(|e| ApiError::Internal(e.into()));
        Ok(Self {
            id: encode(row.id)?,
            nama: row.nama,
            alamat: row.alamat,
            no_hp: row.no_hp,
            paket: PaketEmbed {
                id: encode(row.paket_id)?,
                nama: row.nama_paket,
                harga: row.harga,
                kecepatan: row.kecepatan,
                created_at: row.paket_created_at,
                updated_at: row.paket_updated_at,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
