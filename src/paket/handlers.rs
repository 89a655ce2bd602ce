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
    paket::{
        dto::{PaketListParams, PaketPostRequest, PaketResponse},
        repo::{self, PaketFilter},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/paket", get(list).post(create))
        .route("/paket/:id", get(get_by_id).put(update).delete(delete))
}

fn decode_path_id(state: &AppState, id: &str) -> Result<i64, ApiError> {
    state.codec.decode(id).map_err(|_| ApiError::NotFound("Paket"))
}

#[instrument(skip(state, user))]
async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaketListParams>,
) -> Result<Json<Page<PaketResponse>>, ApiError> {
    authorize(&user, Operation::PaketRead)?;

    let filter = PaketFilter {
        nama: params.nama.clone(),
        kecepatan: params.kecepatan.clone(),
    };
    let page_params = params.page_params();
    let (rows, total) = repo::list(&state.db, &filter, &page_params)
        .await
        .map_err(ApiError::Internal)?;

    let content = rows
        .into_iter()
        .map(|p| PaketResponse::from_row(p, &state.codec))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Page::new(content, params.page, params.size, total)))
}

#[instrument(skip(state, user))]
async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PaketResponse>, ApiError> {
    authorize(&user, Operation::PaketRead)?;
    let id = decode_path_id(&state, &id)?;
    let paket = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Paket"))?;
    Ok(Json(PaketResponse::from_row(paket, &state.codec)?))
}

#[instrument(skip(state, user, payload))]
async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PaketPostRequest>,
) -> Result<(StatusCode, Json<PaketResponse>), ApiError> {
    authorize(&user, Operation::PaketWrite)?;
    let paket = repo::create(&state.db, &payload.nama, payload.harga, &payload.kecepatan)
        .await
        .map_err(ApiError::Internal)?;
    info!(paket_id = paket.id, "paket created");
    Ok((
        StatusCode::CREATED,
        Json(PaketResponse::from_row(paket, &state.codec)?),
    ))
}

#[instrument(skip(state, user, payload))]
async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PaketPostRequest>,
) -> Result<Json<PaketResponse>, ApiError> {
    authorize(&user, Operation::PaketWrite)?;
    let id = decode_path_id(&state, &id)?;
    let paket = repo::update(&state.db, id, &payload.nama, payload.harga, &payload.kecepatan)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Paket"))?;
    info!(paket_id = paket.id, "paket updated");
    Ok(Json(PaketResponse::from_row(paket, &state.codec)?))
}

#[instrument(skip(state, user))]
async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&user, Operation::PaketWrite)?;
    let id = decode_path_id(&state, &id)?;
    if !repo::delete(&state.db, id).await.map_err(ApiError::Internal)? {
        return Err(ApiError::NotFound("Paket"));
    }
    info!(paket_id = id, "paket deleted");
    Ok(Json(
        serde_json::json!({ "message": "Paket deleted successfully" }),
    ))
}
