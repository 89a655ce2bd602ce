use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        extractors::CurrentUser,
        guard::{authorize, Operation},
    },
    error::ApiError,
    pagination::Page,
    pelanggan::{
        dto::{PelangganListParams, PelangganPostRequest, PelangganResponse},
        repo::{self, PelangganFilter},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pelanggan", get(list).post(create))
        .route("/pelanggan/:id", get(get_by_id).put(update).delete(delete))
}

fn decode_path_id(state: &AppState, id: &str) -> Result<i64, ApiError> {
    state
        .codec
        .decode(id)
        .map_err(|_| ApiError::NotFound("Pelanggan"))
}

#[instrument(skip(state, user))]
async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PelangganListParams>,
) -> Result<Json<Page<PelangganResponse>>, ApiError> {
    authorize(&user, Operation::PelangganRead)?;

    let filter = PelangganFilter {
        nama: params.nama.clone(),
        paket_id: params.paket_id,
    };
    let page_params = params.page_params();
    let (rows, total) = repo::list(&state.db, &filter, &page_params)
        .await
        .map_err(ApiError::Internal)?;

    let content = rows
        .into_iter()
        .map(|r| PelangganResponse::from_row(r, &state.codec))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Page::new(content, params.page, params.size, total)))
}

#[instrument(skip(state, user))]
async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PelangganResponse>, ApiError> {
    authorize(&user, Operation::PelangganRead)?;
    let id = decode_path_id(&state, &id)?;
    let row = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Pelanggan"))?;
    Ok(Json(PelangganResponse::from_row(row, &state.codec)?))
}

#[instrument(skip(state, user, payload))]
async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PelangganPostRequest>,
) -> Result<(StatusCode, Json<PelangganResponse>), ApiError> {
    authorize(&user, Operation::PelangganWrite)?;

    if crate::paket::repo::get(&state.db, payload.paket_id)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Paket"));
    }

    let id = repo::create(
        &state.db,
        &payload.nama,
        &payload.alamat,
        &payload.no_hp,
        payload.paket_id,
    )
    .await
    .map_err(ApiError::Internal)?;

    let row = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Pelanggan"))?;
    info!(pelanggan_id = id, "pelanggan created");
    Ok((
        StatusCode::CREATED,
        Json(PelangganResponse::from_row(row, &state.codec)?),
    ))
}

#[instrument(skip(state, user, payload))]
async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PelangganPostRequest>,
) -> Result<Json<PelangganResponse>, ApiError> {
    authorize(&user, Operation::PelangganWrite)?;
    let id = decode_path_id(&state, &id)?;

    if crate::paket::repo::get(&state.db, payload.paket_id)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::NotFound("Paket"));
    }

    let updated = repo::update(
        &state.db,
        id,
        &payload.nama,
        &payload.alamat,
        &payload.no_hp,
        payload.paket_id,
    )
    .await
    .map_err(ApiError::Internal)?;
    if !updated {
        return Err(ApiError::NotFound("Pelanggan"));
    }

    let row = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Pelanggan"))?;
    info!(pelanggan_id = id, "pelanggan updated");
    Ok(Json(PelangganResponse::from_row(row, &state.codec)?))
}

#[instrument(skip(state, user))]
async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&user, Operation::PelangganWrite)?;
    let id = decode_path_id(&state, &id)?;
    if !repo::delete(&state.db, id).await.map_err(ApiError::Internal)? {
        return Err(ApiError::NotFound("Pelanggan"));
    }
    info!(pelanggan_id = id, "pelanggan deleted");
    Ok(Json(
        serde_json::json!({ "message": "Pelanggan deleted successfully" }),
    ))
}
