//! Film repository: list, search and mutation of films with their crews.
//!
//! List and search run one joined query each and group the flat rows into
//! `film -> crew` aggregates in memory. Pagination and sorting are applied
//! to the film set in a subquery, so a film's crew size cannot eat into
//! the page.

use crate::errors::CatalogError;
use crate::repositories::write_error;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

/// Sort order for film listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    Name,
    /// Descending; the catalog's default ordering.
    #[default]
    Rating,
    ReleaseDate,
}

impl FromStr for SortBy {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortBy::Name),
            "rating" => Ok(SortBy::Rating),
            "release_date" => Ok(SortBy::ReleaseDate),
            other => Err(CatalogError::Validation(format!(
                "unknown sort_by value: {other}"
            ))),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortBy::Name => "name",
            SortBy::Rating => "rating",
            SortBy::ReleaseDate => "release_date",
        })
    }
}

/// A film with its embedded crew.
#[derive(Debug, Clone, Serialize)]
pub struct Film {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub release_date: NaiveDate,
    pub crew: Vec<CrewMember>,
}

/// An actor as embedded in a film's crew.
#[derive(Debug, Clone, Serialize)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub birth_date: NaiveDate,
}

/// One flat row of the film/actor join. Actor columns are NULL for films
/// without any crew (LEFT JOIN).
#[derive(sqlx::FromRow)]
struct FilmRow {
    id: i64,
    name: String,
    description: String,
    rating: f64,
    release_date: NaiveDate,
    actor_id: Option<i64>,
    actor_name: Option<String>,
    actor_gender: Option<String>,
    actor_birthdate: Option<NaiveDate>,
}

/// Groups flat join rows into films, preserving row order.
fn group_rows(rows: Vec<FilmRow>) -> Vec<Film> {
    let mut films: Vec<Film> = Vec::new();

    for row in rows {
        let crew_member = match (
            row.actor_id,
            row.actor_name,
            row.actor_gender,
            row.actor_birthdate,
        ) {
            (Some(id), Some(name), Some(gender), Some(birth_date)) => Some(CrewMember {
                id,
                name,
                gender,
                birth_date,
            }),
            _ => None,
        };

        if let Some(film) = films.iter_mut().find(|f| f.id == row.id) {
            film.crew.extend(crew_member);
        } else {
            films.push(Film {
                id: row.id,
                title: row.name,
                description: row.description,
                rating: row.rating,
                release_date: row.release_date,
                crew: crew_member.into_iter().collect(),
            });
        }
    }

    films
}

/// List films with their crews, sorted and paginated.
pub async fn list(
    pool: &PgPool,
    sort_by: SortBy,
    limit: i64,
    offset: i64,
) -> Result<Vec<Film>, CatalogError> {
    // The ORDER BY cannot be bound as a parameter; it is interpolated from
    // a fixed set of strings, never from user input.
    let order = match sort_by {
        SortBy::Name => "f.name",
        SortBy::Rating => "f.rating DESC",
        SortBy::ReleaseDate => "f.release_date",
    };

    let query = format!(
        r#"
        SELECT f.id, f.name, f.description, f.rating, f.release_date,
               a.id AS actor_id, a.name AS actor_name,
               a.gender AS actor_gender, a.birthdate AS actor_birthdate
        FROM (SELECT * FROM film ORDER BY {order} LIMIT $1 OFFSET $2) f
        LEFT JOIN film_actor fa ON f.id = fa.film_id
        LEFT JOIN actor a ON fa.actor_id = a.id
        ORDER BY {order}, f.id, a.id
        "#
    );

    let rows: Vec<FilmRow> = sqlx::query_as(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to list films: {e}")))?;

    Ok(group_rows(rows))
}

/// Search films by film or actor name substring, prefix matches first.
pub async fn search(
    pool: &PgPool,
    film_name: &str,
    actor_name: &str,
) -> Result<Vec<Film>, CatalogError> {
    let rows: Vec<FilmRow> = sqlx::query_as(
        r#"
        SELECT f.id, f.name, f.description, f.rating, f.release_date,
               a.id AS actor_id, a.name AS actor_name,
               a.gender AS actor_gender, a.birthdate AS actor_birthdate
        FROM film f
        JOIN film_actor fa ON f.id = fa.film_id
        JOIN actor a ON a.id = fa.actor_id
        WHERE f.name ILIKE $1 || '%'
           OR f.name ILIKE '%' || $1 || '%'
           OR a.name ILIKE $2 || '%'
           OR a.name ILIKE '%' || $2 || '%'
        ORDER BY
            (CASE
                WHEN f.name ILIKE $1 || '%' THEN 1
                WHEN f.name ILIKE '%' || $1 || '%' THEN 2
                WHEN a.name ILIKE $2 || '%' THEN 3
                WHEN a.name ILIKE '%' || $2 || '%' THEN 4
                ELSE 5
            END),
            f.id, a.id
        "#,
    )
    .bind(film_name)
    .bind(actor_name)
    .fetch_all(pool)
    .await
    .map_err(|e| CatalogError::Database(format!("Failed to search films: {e}")))?;

    Ok(group_rows(rows))
}

/// Insert a film and its crew links in one transaction.
pub async fn add(
    pool: &PgPool,
    title: &str,
    description: &str,
    rating: f64,
    release_date: NaiveDate,
    crew: &[i64],
) -> Result<i64, CatalogError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to begin transaction: {e}")))?;

    let (film_id,): (i64,) = sqlx::query_as(
        "INSERT INTO film (name, description, rating, release_date) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(title)
    .bind(description)
    .bind(rating)
    .bind(release_date)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| write_error(e, "film insert"))?;

    for actor_id in crew {
        sqlx::query("INSERT INTO film_actor (film_id, actor_id) VALUES ($1, $2)")
            .bind(film_id)
            .bind(actor_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "crew link insert"))?;
    }

    tx.commit()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to commit film insert: {e}")))?;

    Ok(film_id)
}

/// Partially update a film and rewrite its crew links.
///
/// `None` fields keep their stored values (COALESCE); the crew list is
/// replaced wholesale. `NotFound` when the id does not exist.
#[allow(clippy::too_many_arguments)]
pub async fn edit(
    pool: &PgPool,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    rating: f64,
    release_date: Option<NaiveDate>,
    crew: &[i64],
) -> Result<(), CatalogError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to begin transaction: {e}")))?;

    let updated = sqlx::query(
        r#"
        UPDATE film
        SET name = COALESCE($1, name),
            description = COALESCE($2, description),
            rating = $3,
            release_date = COALESCE($4, release_date)
        WHERE id = $5
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(rating)
    .bind(release_date)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| write_error(e, "film update"))?;

    if updated.rows_affected() == 0 {
        return Err(CatalogError::NotFound("film"));
    }

    sqlx::query("DELETE FROM film_actor WHERE film_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "crew link delete"))?;

    for actor_id in crew {
        sqlx::query("INSERT INTO film_actor (film_id, actor_id) VALUES ($1, $2)")
            .bind(id)
            .bind(actor_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "crew link insert"))?;
    }

    tx.commit()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to commit film update: {e}")))?;

    Ok(())
}

/// Delete a film, link rows first. `NotFound` when the id does not exist.
pub async fn remove(pool: &PgPool, id: i64) -> Result<(), CatalogError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to begin transaction: {e}")))?;

    sqlx::query("DELETE FROM film_actor WHERE film_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "crew link delete"))?;

    let deleted = sqlx::query("DELETE FROM film WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "film delete"))?;

    if deleted.rows_affected() == 0 {
        return Err(CatalogError::NotFound("film"));
    }

    tx.commit()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to commit film delete: {e}")))?;

    Ok(())
}
