//! Actor repository: listing with filmographies and mutation.

use crate::errors::CatalogError;
use crate::repositories::write_error;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

/// An actor with the films they appear in.
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub birth_date: NaiveDate,
    pub films: Vec<FilmCredit>,
}

/// A film as embedded in an actor's filmography.
#[derive(Debug, Clone, Serialize)]
pub struct FilmCredit {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub release_date: NaiveDate,
}

/// One flat row of the actor/film join. Film columns are NULL for actors
/// with no credits (LEFT JOIN).
#[derive(sqlx::FromRow)]
struct ActorRow {
    id: i64,
    name: String,
    gender: String,
    birthdate: NaiveDate,
    film_id: Option<i64>,
    film_name: Option<String>,
    film_description: Option<String>,
    film_rating: Option<f64>,
    film_release_date: Option<NaiveDate>,
}

fn group_rows(rows: Vec<ActorRow>) -> Vec<Actor> {
    let mut actors: Vec<Actor> = Vec::new();

    for row in rows {
        let credit = match (
            row.film_id,
            row.film_name,
            row.film_description,
            row.film_rating,
            row.film_release_date,
        ) {
            (Some(id), Some(title), Some(description), Some(rating), Some(release_date)) => {
                Some(FilmCredit {
                    id,
                    title,
                    description,
                    rating,
                    release_date,
                })
            }
            _ => None,
        };

        if let Some(actor) = actors.iter_mut().find(|a| a.id == row.id) {
            actor.films.extend(credit);
        } else {
            actors.push(Actor {
                id: row.id,
                name: row.name,
                gender: row.gender,
                birth_date: row.birthdate,
                films: credit.into_iter().collect(),
            });
        }
    }

    actors
}

/// List actors with their filmographies, ordered by id, paginated.
pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Actor>, CatalogError> {
    let rows: Vec<ActorRow> = sqlx::query_as(
        r#"
        SELECT a.id, a.name, a.gender, a.birthdate,
               f.id AS film_id, f.name AS film_name,
               f.description AS film_description, f.rating AS film_rating,
               f.release_date AS film_release_date
        FROM (SELECT * FROM actor ORDER BY id LIMIT $1 OFFSET $2) a
        LEFT JOIN film_actor fa ON fa.actor_id = a.id
        LEFT JOIN film f ON fa.film_id = f.id
        ORDER BY a.id, f.id
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| CatalogError::Database(format!("Failed to list actors: {e}")))?;

    Ok(group_rows(rows))
}

/// Insert an actor.
pub async fn add(
    pool: &PgPool,
    name: &str,
    gender: &str,
    birth_date: NaiveDate,
) -> Result<i64, CatalogError> {
    let (actor_id,): (i64,) = sqlx::query_as(
        "INSERT INTO actor (name, gender, birthdate) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(gender)
    .bind(birth_date)
    .fetch_one(pool)
    .await
    .map_err(|e| write_error(e, "actor insert"))?;

    Ok(actor_id)
}

/// Partially update an actor and rewrite their film links.
///
/// `None` fields keep their stored values; the film list is replaced
/// wholesale. `NotFound` when the id does not exist.
pub async fn edit(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    gender: Option<&str>,
    birth_date: Option<NaiveDate>,
    films: &[i64],
) -> Result<(), CatalogError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to begin transaction: {e}")))?;

    let updated = sqlx::query(
        r#"
        UPDATE actor
        SET name = COALESCE($1, name),
            gender = COALESCE($2, gender),
            birthdate = COALESCE($3, birthdate)
        WHERE id = $4
        "#,
    )
    .bind(name)
    .bind(gender)
    .bind(birth_date)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| write_error(e, "actor update"))?;

    if updated.rows_affected() == 0 {
        return Err(CatalogError::NotFound("actor"));
    }

    sqlx::query("DELETE FROM film_actor WHERE actor_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "film link delete"))?;

    for film_id in films {
        sqlx::query("INSERT INTO film_actor (film_id, actor_id) VALUES ($1, $2)")
            .bind(film_id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "film link insert"))?;
    }

    tx.commit()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to commit actor update: {e}")))?;

    Ok(())
}

/// Delete an actor, link rows first. `NotFound` when the id does not exist.
pub async fn remove(pool: &PgPool, id: i64) -> Result<(), CatalogError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to begin transaction: {e}")))?;

    sqlx::query("DELETE FROM film_actor WHERE actor_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "film link delete"))?;

    let deleted = sqlx::query("DELETE FROM actor WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "actor delete"))?;

    if deleted.rows_affected() == 0 {
        return Err(CatalogError::NotFound("actor"));
    }

    tx.commit()
        .await
        .map_err(|e| CatalogError::Database(format!("Failed to commit actor delete: {e}")))?;

    Ok(())
}
