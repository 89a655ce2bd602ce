use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::CurrentUser,
        guard::{authorize, Operation},
    },
    error::ApiError,
    pagination::Page,
    state::AppState,
    tagihan::{
        dto::{TagihanListParams, TagihanPostRequest, TagihanResponse, TagihanSummaryItem},
        repo::{self, TagihanFilter},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tagihan", get(list).post(create))
        .route("/tagihan/summary/:tahun", get(summary))
        .route("/tagihan/:id", get(get_by_id).put(update).delete(delete))
}

fn decode_path_id(state: &AppState, id: &str) -> Result<i64, ApiError> {
    state
        .codec
        .decode(id)
        .map_err(|_| ApiError::NotFound("Tagihan"))
}

/// Resolves the opaque customer/package references in an invoice body and
/// checks both rows exist before any write happens.
async fn resolve_references(
    state: &AppState,
    payload: &TagihanPostRequest,
) -> Result<(i64, i64), ApiError> {
    let pelanggan_id = state
        .codec
        .decode(&payload.pelanggan_id)
        .map_err(|_| ApiError::NotFound("Pelanggan"))?;
    let paket_id = state
        .codec
        .decode(&payload.paket_id)
        .map_err(|_| ApiError::NotFound("Paket"))?;

    if crate::pelanggan::repo::get(&state.db, pelanggan_id)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Pelanggan"));
    }
    if crate::paket::repo::get(&state.db, paket_id)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Paket"));
    }
    Ok((pelanggan_id, paket_id))
}

#[instrument(skip(state, user))]
async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<TagihanListParams>,
) -> Result<Json<Page<TagihanResponse>>, ApiError> {
    let scope = authorize(&user, Operation::TagihanList)?;

    let filter = TagihanFilter {
        tahun: params.tahun,
        bulan: params.bulan,
        pelanggan_id: params.pelanggan_id,
        paket_id: params.paket_id,
    }
    .scoped(scope);

    let page_params = params.page_params();
    let (rows, total) = repo::list(&state.db, &filter, &page_params)
        .await
        .map_err(ApiError::Internal)?;

    let content = rows
        .into_iter()
        .map(|r| TagihanResponse::from_row(r, &state.codec))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Page::new(content, params.page, params.size, total)))
}

#[instrument(skip(state, user))]
async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<TagihanResponse>, ApiError> {
    // Detail stays admin-only even for the caller's own invoice.
    authorize(&user, Operation::TagihanDetail)?;
    let id = decode_path_id(&state, &id)?;
    let row = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Tagihan"))?;
    Ok(Json(TagihanResponse::from_row(row, &state.codec)?))
}

#[instrument(skip(state, user, payload))]
async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<TagihanPostRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    authorize(&user, Operation::TagihanWrite)?;
    let (pelanggan_id, paket_id) = resolve_references(&state, &payload).await?;
    let tanggal_bayar = payload.parse_tanggal_bayar()?;

    match repo::create(
        &state.db,
        pelanggan_id,
        paket_id,
        payload.tahun,
        payload.bulan,
        tanggal_bayar,
    )
    .await
    .map_err(ApiError::Internal)?
    {
        Some(id) => info!(tagihan_id = id, pelanggan_id, "tagihan created"),
        None => warn!(pelanggan_id, tahun = payload.tahun, bulan = payload.bulan,
            "tagihan already exists for period, skipped"),
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Tagihan saved successfully" })),
    ))
}

#[instrument(skip(state, user, payload))]
async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<TagihanPostRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&user, Operation::TagihanWrite)?;
    let id = decode_path_id(&state, &id)?;
    let (pelanggan_id, paket_id) = resolve_references(&state, &payload).await?;
    let tanggal_bayar = payload.parse_tanggal_bayar()?;

    let updated = repo::update(
        &state.db,
        id,
        pelanggan_id,
        paket_id,
        payload.tahun,
        payload.bulan,
        tanggal_bayar,
    )
    .await
    .map_err(ApiError::Internal)?;
    if !updated {
        return Err(ApiError::NotFound("Tagihan"));
    }
    info!(tagihan_id = id, "tagihan updated");
    Ok(Json(
        serde_json::json!({ "message": "Tagihan updated successfully" }),
    ))
}

#[instrument(skip(state, user))]
async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&user, Operation::TagihanWrite)?;
    let id = decode_path_id(&state, &id)?;
    if !repo::delete(&state.db, id).await.map_err(ApiError::Internal)? {
        return Err(ApiError::NotFound("Tagihan"));
    }
    info!(tagihan_id = id, "tagihan deleted");
    Ok(Json(
        serde_json::json!({ "message": "Tagihan deleted successfully" }),
    ))
}

#[instrument(skip(state, user))]
async fn summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tahun): Path<i32>,
) -> Result<Json<Vec<TagihanSummaryItem>>, ApiError> {
    let scope = authorize(&user, Operation::TagihanSummary)?;
    let rows = repo::summary(&state.db, tahun, scope)
        .await
        .map_err(ApiError::Internal)?;
    let items = rows
        .into_iter()
        .map(|r| TagihanSummaryItem::from_row(r, &state.codec))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}
