//! Film catalog handlers.

use crate::errors::CatalogError;
use crate::handlers::{accept, AppState, Pagination, StatusResponse};
use crate::repositories::films::{self, Film, SortBy};
use crate::validation;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct ListFilmsQuery {
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FilmsListResponse {
    pub films: Vec<Film>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchFilmsQuery {
    #[serde(default)]
    pub film_name: String,
    #[serde(default)]
    pub actor_name: String,
}

#[derive(Debug, Serialize)]
pub struct SearchFilmsResponse {
    pub film_data: Vec<Film>,
}

#[derive(Debug, Deserialize)]
pub struct AddFilmRequest {
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub crew: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EditFilmRequest {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub rating: f64,
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub crew: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFilmRequest {
    pub id: i64,
}

/// List films with their crews.
///
/// GET /api/v1/films?sort_by=&page=&size=
#[instrument(skip_all, name = "catalog.handlers.films.list")]
pub async fn list_films(
    State(state): State<AppState>,
    Query(query): Query<ListFilmsQuery>,
) -> Result<Json<FilmsListResponse>, CatalogError> {
    let sort_by = match query.sort_by.as_deref() {
        None | Some("") => SortBy::default(),
        Some(value) => value.parse()?,
    };
    let (limit, offset) = Pagination {
        page: query.page,
        size: query.size,
    }
    .limit_offset();

    let films = films::list(&state.pool, sort_by, limit, offset).await?;

    Ok(Json(FilmsListResponse { films }))
}

/// Search films by film or actor name.
///
/// GET /api/v1/films/search?film_name=&actor_name=
///
/// An empty result is a 404, matching the route's "searched and found
/// nothing" contract.
#[instrument(skip_all, name = "catalog.handlers.films.search")]
pub async fn search_films(
    State(state): State<AppState>,
    Query(query): Query<SearchFilmsQuery>,
) -> Result<Json<SearchFilmsResponse>, CatalogError> {
    let films = films::search(&state.pool, &query.film_name, &query.actor_name).await?;

    if films.is_empty() {
        return Err(CatalogError::NotFound("film"));
    }

    Ok(Json(SearchFilmsResponse { film_data: films }))
}

/// Add a film.
///
/// POST /api/v1/films/add (admin)
#[instrument(skip_all, name = "catalog.handlers.films.add")]
pub async fn add_film(
    State(state): State<AppState>,
    payload: Result<Json<AddFilmRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, CatalogError> {
    let request = accept(payload)?;

    validation::validate_film(&request.title, &request.description, request.rating)?;

    let film_id = films::add(
        &state.pool,
        &request.title,
        &request.description,
        request.rating,
        request.release_date,
        &request.crew,
    )
    .await?;

    tracing::info!(target: "catalog.handlers.films", film_id, "Film added");
    Ok(StatusResponse::ok())
}

/// Edit a film.
///
/// POST /api/v1/films/edit (admin)
#[instrument(skip_all, name = "catalog.handlers.films.edit")]
pub async fn edit_film(
    State(state): State<AppState>,
    payload: Result<Json<EditFilmRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, CatalogError> {
    let request = accept(payload)?;

    validation::validate_rating(request.rating)?;
    if let Some(title) = &request.title {
        validation::validate_title(title)?;
    }
    if let Some(description) = &request.description {
        validation::validate_description(description)?;
    }

    films::edit(
        &state.pool,
        request.id,
        request.title.as_deref(),
        request.description.as_deref(),
        request.rating,
        request.release_date,
        &request.crew,
    )
    .await?;

    tracing::info!(target: "catalog.handlers.films", film_id = request.id, "Film edited");
    Ok(StatusResponse::ok())
}

/// Remove a film.
///
/// POST /api/v1/films/remove (admin)
#[instrument(skip_all, name = "catalog.handlers.films.remove")]
pub async fn remove_film(
    State(state): State<AppState>,
    payload: Result<Json<RemoveFilmRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, CatalogError> {
    let request = accept(payload)?;

    films::remove(&state.pool, request.id).await?;

    tracing::info!(target: "catalog.handlers.films", film_id = request.id, "Film removed");
    Ok(StatusResponse::ok())
}
