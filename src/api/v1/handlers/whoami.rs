/*
 * Responsibility
 * - GET /whoami: echo the published principal (name, sid, roles, authorities)
 */
use axum::Json;

use crate::api::v1::extractors::CurrentPrincipal;
use crate::services::auth::Principal;

pub async fn whoami(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
    Json(principal)
}
