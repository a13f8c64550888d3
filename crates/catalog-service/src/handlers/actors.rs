//! Actor catalog handlers.

use crate::errors::CatalogError;
use crate::handlers::{accept, AppState, Pagination, StatusResponse};
use crate::repositories::actors::{self, Actor};
use crate::validation;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Serialize)]
pub struct ActorsListResponse {
    pub actors: Vec<Actor>,
}

#[derive(Debug, Deserialize)]
pub struct AddActorRequest {
    pub name: String,
    pub gender: String,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct EditActorRequest {
    pub id: i64,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub films: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveActorRequest {
    pub id: i64,
}

/// List actors with their filmographies.
///
/// GET /api/v1/actors?page=&size=
#[instrument(skip_all, name = "catalog.handlers.actors.list")]
pub async fn list_actors(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ActorsListResponse>, CatalogError> {
    let (limit, offset) = pagination.limit_offset();

    let actors = actors::list(&state.pool, limit, offset).await?;

    Ok(Json(ActorsListResponse { actors }))
}

/// Add an actor.
///
/// POST /api/v1/actors/add (admin)
#[instrument(skip_all, name = "catalog.handlers.actors.add")]
pub async fn add_actor(
    State(state): State<AppState>,
    payload: Result<Json<AddActorRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, CatalogError> {
    let request = accept(payload)?;

    validation::validate_actor_name(&request.name)?;

    let actor_id = actors::add(
        &state.pool,
        &request.name,
        &request.gender,
        request.birth_date,
    )
    .await?;

    tracing::info!(target: "catalog.handlers.actors", actor_id, "Actor added");
    Ok(StatusResponse::ok())
}

/// Edit an actor.
///
/// POST /api/v1/actors/edit (admin)
#[instrument(skip_all, name = "catalog.handlers.actors.edit")]
pub async fn edit_actor(
    State(state): State<AppState>,
    payload: Result<Json<EditActorRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, CatalogError> {
    let request = accept(payload)?;

    if let Some(name) = &request.name {
        validation::validate_actor_name(name)?;
    }

    actors::edit(
        &state.pool,
        request.id,
        request.name.as_deref(),
        request.gender.as_deref(),
        request.birth_date,
        &request.films,
    )
    .await?;

    tracing::info!(target: "catalog.handlers.actors", actor_id = request.id, "Actor edited");
    Ok(StatusResponse::ok())
}

/// Remove an actor.
///
/// POST /api/v1/actors/remove (admin)
#[instrument(skip_all, name = "catalog.handlers.actors.remove")]
pub async fn remove_actor(
    State(state): State<AppState>,
    payload: Result<Json<RemoveActorRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, CatalogError> {
    let request = accept(payload)?;

    actors::remove(&state.pool, request.id).await?;

    tracing::info!(target: "catalog.handlers.actors", actor_id = request.id, "Actor removed");
    Ok(StatusResponse::ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_request_requires_all_fields() {
        let request: AddActorRequest = serde_json::from_str(
            r#"{"name":"Al Pacino","gender":"male","birth_date":"1940-04-25"}"#,
        )
        .unwrap();
        assert_eq!(request.name, "Al Pacino");

        let missing = serde_json::from_str::<AddActorRequest>(r#"{"name":"Al Pacino"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_edit_request_optional_fields() {
        let request: EditActorRequest =
            serde_json::from_str(r#"{"id":10,"name":"Al Pacino"}"#).unwrap();

        assert_eq!(request.id, 10);
        assert!(request.gender.is_none());
        assert!(request.birth_date.is_none());
        assert!(request.films.is_empty());
    }
}
