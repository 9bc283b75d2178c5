use axum::Json;
use axum::extract::State;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::extractors::caller::Caller;
use crate::extractors::payload::AppPayload;
use crate::models::link::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/links",
    tag = "Links",
    operation_id = "listLinks",
    summary = "List the caller's links",
    description = "Returns every link owned by the identity derived from the caller's address. Owner hash and creation time are never included. Returns `null` if the store fails.",
    responses(
        (status = 200, description = "Links owned by the caller, or null", body = Vec<LinkResponse>),
    ),
)]
#[instrument(skip(state, caller))]
pub async fn list_links(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let links = state.store.list_by_identity(&caller.identity).await?;
    Ok(Json(links))
}

#[utoipa::path(
    post,
    path = "/newlink",
    tag = "Links",
    operation_id = "createLink",
    summary = "Post a link or note",
    description = "Stores a new link owned by the caller. `isLink` is true when `link` is an absolute http(s) URI. Returns `null` when `link` is missing, both fields are empty, a field is too long, or the caller already owns the maximum number of links.",
    request_body = CreateLinkRequest,
    responses(
        (status = 200, description = "The stored link, or null", body = LinkResponse),
    ),
)]
#[instrument(skip(state, caller, payload))]
pub async fn create_link(
    caller: Caller,
    State(state): State<AppState>,
    AppPayload(payload): AppPayload<CreateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let draft = LinkDraft::from_input(&caller.identity, payload.link, payload.description)?;

    // Count and insert are separate calls; concurrent creates may overshoot.
    let limit = state.config.limits.max_links_per_identity;
    let owned = state.store.count_by_identity(&caller.identity).await?;
    if owned >= limit {
        return Err(AppError::QuotaExceeded { owned, limit });
    }

    draft.validate()?;
    let created = state.store.insert(draft).await?;

    info!(id = %created.id, is_link = created.is_link, "Link created");
    Ok(Json(created))
}

#[utoipa::path(
    put,
    path = "/editlink",
    tag = "Links",
    operation_id = "editLink",
    summary = "Replace a link",
    description = "Overwrites content, description and `isLink` of a link owned by the caller's current identity. The owner hash is recomputed from the current request and the creation time is reset. Returns `null` when the id is missing or malformed, the fields are invalid, or no link with that id belongs to the caller.",
    request_body = EditLinkRequest,
    responses(
        (status = 200, description = "The updated link, or null", body = LinkResponse),
    ),
)]
#[instrument(skip(state, caller, payload), fields(id = ?payload.id))]
pub async fn edit_link(
    caller: Caller,
    State(state): State<AppState>,
    AppPayload(payload): AppPayload<EditLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let draft = LinkDraft::from_input(&caller.identity, payload.link, payload.description)?;
    draft.validate()?;
    let id = LinkId::from_field(payload.id.as_deref())?;

    let updated = state.store.update_one(&id, &caller.identity, draft).await?;

    info!(%id, "Link updated");
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/deletelink",
    tag = "Links",
    operation_id = "deleteLink",
    summary = "Delete one link",
    description = "Deletes the link with the given id if it belongs to the caller's current identity. Returns `\"ok\"` on success, `null` otherwise.",
    request_body = DeleteLinkRequest,
    responses(
        (status = 200, description = "\"ok\", or null", body = String),
    ),
)]
#[instrument(skip(state, caller, payload), fields(id = ?payload.id))]
pub async fn delete_link(
    caller: Caller,
    State(state): State<AppState>,
    AppPayload(payload): AppPayload<DeleteLinkRequest>,
) -> Result<Json<&'static str>, AppError> {
    let id = LinkId::from_field(payload.id.as_deref())?;

    state.store.delete_one(&id, &caller.identity).await?;

    info!(%id, "Link deleted");
    Ok(Json("ok"))
}

#[utoipa::path(
    post,
    path = "/deleteall",
    tag = "Links",
    operation_id = "deleteAllLinks",
    summary = "Delete all of the caller's links",
    description = "Deletes every link owned by the caller's current identity and returns how many were removed (0 is a success). Any request body is ignored. Returns `null` if the store fails.",
    responses(
        (status = 200, description = "Number of links removed, or null", body = u64),
    ),
)]
#[instrument(skip(state, caller))]
pub async fn delete_all_links(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<u64>, AppError> {
    let removed = state.store.delete_all_by_identity(&caller.identity).await?;

    info!(removed, "Links deleted");
    Ok(Json(removed))
}
