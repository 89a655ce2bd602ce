use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::ids::IdCodec;
use crate::pagination::PageParams;
use crate::paket::repo::Paket;

fn default_page() -> i64 {
    1
}
fn default_size() -> i64 {
    10
}

/// Query parameters for `GET /paket`.
#[derive(Debug, Deserialize)]
pub struct PaketListParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub nama: Option<String>,
    pub kecepatan: Option<String>,
}

impl PaketListParams {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort: self.sort.clone(),
            direction: self.direction.clone(),
        }
    }
}

/// Request body for creating or replacing a paket.
#[derive(Debug, Deserialize)]
pub struct PaketPostRequest {
    pub nama: String,
    pub harga: i64,
    pub kecepatan: String,
}

#[derive(Debug, Serialize)]
pub struct PaketResponse {
    pub id: String,
    pub nama: String,
    pub harga: i64,
    pub kecepatan: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PaketResponse {
    pub fn from_row(paket: Paket, codec: &IdCodec) -> Result<Self, ApiError> {
        Ok(Self {
            id: codec
                .encode(paket.id)
                .map_err(|e| ApiError::Internal(e.into()))?,
            nama: paket.nama,
            harga: paket.harga,
            kecepatan: paket.kecepatan,
            created_at: paket.created_at,
            updated_at: paket.updated_at,
        })
    }
}
