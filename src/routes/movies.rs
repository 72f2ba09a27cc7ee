use crate::{
    auth::AuthenticatedUserId,
    error::{is_unique_violation, AppError},
    models::{Movie, MovieInput},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

const MOVIE_COLUMNS: &str = "id, title, nb_film, loc, added_by, extra, created_at";

/// Lists the whole movie stock.
///
/// Public endpoint: no token required. Movies are ordered by the date they
/// were added, newest first.
///
/// ## Responses:
/// - `200 OK`: JSON array of movie objects (typed fields plus any
///   caller-supplied extra fields, flattened).
#[get("")]
pub async fn list_movies(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let movies = sqlx::query_as::<_, Movie>(&format!(
        "SELECT {} FROM movies ORDER BY created_at DESC",
        MOVIE_COLUMNS
    ))
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(movies))
}

/// Retrieves a single movie by id.
///
/// Public endpoint: no token required.
///
/// ## Responses:
/// - `200 OK`: the movie as JSON.
/// - `404 Not Found`: no movie with the given id.
#[get("/{id}")]
pub async fn get_movie(
    pool: web::Data<PgPool>,
    movie_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let movie = sqlx::query_as::<_, Movie>(&format!(
        "SELECT {} FROM movies WHERE id = $1",
        MOVIE_COLUMNS
    ))
    .bind(movie_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match movie {
        Some(movie) => Ok(HttpResponse::Ok().json(movie)),
        None => Err(AppError::MovieNotFound),
    }
}

/// Adds a movie to the stock.
///
/// The authenticated user becomes the movie's owner (`added_by`), and the
/// new id is appended to that user's movie list. Fields beyond the typed
/// set (`title`, `nbFilm`, `loc`) are stored as-is in the open bag.
///
/// ## Responses:
/// - `200 OK`: `{"id": <uuid>}` of the new movie.
/// - `400 Bad Request`: missing/invalid fields, or `loc > nbFilm`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `409 Conflict`: a movie with the same title already exists.
#[post("")]
pub async fn create_movie(
    pool: web::Data<PgPool>,
    movie_data: web::Json<MovieInput>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    movie_data.validate_input()?;

    let movie = Movie::new(movie_data.into_inner(), user.0);

    sqlx::query(
        "INSERT INTO movies (id, title, nb_film, loc, added_by, extra, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(movie.id)
    .bind(&movie.title)
    .bind(movie.nb_film)
    .bind(movie.loc)
    .bind(movie.added_by)
    .bind(&movie.extra)
    .bind(movie.created_at)
    .execute(&**pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::MovieAlreadyExists
        } else {
            e.into()
        }
    })?;

    // Append the reference to the owner's movie list.
    sqlx::query("UPDATE users SET movies = array_append(movies, $1) WHERE id = $2")
        .bind(movie.id)
        .bind(user.0)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "id": movie.id })))
}

/// Applies a partial update to a movie.
///
/// Only the owner may update a movie; for anyone else the movie is reported
/// as not found. Typed keys update the typed columns, unknown keys are
/// upserted into the open bag, and server-managed fields are rejected.
///
/// ## Responses:
/// - `200 OK`: empty body.
/// - `400 Bad Request`: malformed patch or a patch leaving `loc > nbFilm`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: no movie with this id owned by the caller.
#[put("/{id}")]
pub async fn update_movie(
    pool: web::Data<PgPool>,
    movie_id: web::Path<Uuid>,
    patch: web::Json<Map<String, Value>>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let movie_id = movie_id.into_inner();

    // Authorize by fetching the movie filtered by (id, owner).
    let movie = sqlx::query_as::<_, Movie>(&format!(
        "SELECT {} FROM movies WHERE id = $1 AND added_by = $2",
        MOVIE_COLUMNS
    ))
    .bind(movie_id)
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?;

    let mut movie = movie.ok_or(AppError::UpdatingMovie)?;
    movie.apply_patch(patch.into_inner())?;

    sqlx::query("UPDATE movies SET title = $1, nb_film = $2, loc = $3, extra = $4 WHERE id = $5")
        .bind(&movie.title)
        .bind(movie.nb_film)
        .bind(movie.loc)
        .bind(&movie.extra)
        .bind(movie.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().finish())
}

/// Deletes a movie from the stock.
///
/// Only the owner may delete a movie; for anyone else the movie is reported
/// as not found.
///
/// ## Responses:
/// - `200 OK`: empty body.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: no movie with this id owned by the caller.
#[delete("/{id}")]
pub async fn delete_movie(
    pool: web::Data<PgPool>,
    movie_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM movies WHERE id = $1 AND added_by = $2")
        .bind(movie_id.into_inner())
        .bind(user.0)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::DeletingMovie);
    }

    Ok(HttpResponse::Ok().finish())
}

/// Overwrites the number of copies owned (`nbFilm`).
///
/// Any authenticated user may restock; there is no ownership check. The new
/// value must not drop below the number of copies currently on loan.
///
/// ## Responses:
/// - `200 OK`: empty body.
/// - `400 Bad Request`: new `nbFilm` below the current `loc`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: no movie with the given id.
#[put("/{id}/nbfilm/{nb_film}")]
pub async fn update_nb_film(
    pool: web::Data<PgPool>,
    path: web::Path<(Uuid, i32)>,
    _user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let (movie_id, nb_film) = path.into_inner();

    let result = sqlx::query("UPDATE movies SET nb_film = $1 WHERE id = $2 AND loc <= $1")
        .bind(nb_film)
        .bind(movie_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(reject_counter_update(&pool, movie_id, "nbFilm cannot drop below the copies on loan").await);
    }

    Ok(HttpResponse::Ok().finish())
}

/// Adjusts the number of copies on loan (`loc`) by a signed delta.
///
/// Any authenticated user may loan or return copies; there is no ownership
/// check. The adjustment is a single conditional update, so concurrent
/// calls cannot jointly push `loc` past `nbFilm` or below zero.
///
/// ## Responses:
/// - `200 OK`: empty body.
/// - `400 Bad Request`: the adjusted `loc` would leave `[0, nbFilm]`; the
///   counter is left unchanged.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: no movie with the given id.
#[put("/{id}/loc/{loc}")]
pub async fn update_loc(
    pool: web::Data<PgPool>,
    path: web::Path<(Uuid, i32)>,
    _user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let (movie_id, delta) = path.into_inner();

    // The predicate runs in bigint so a delta near i32::MAX falls out of
    // the bound check instead of overflowing integer arithmetic; the SET
    // expression only evaluates once the bounds already hold.
    let result = sqlx::query(
        "UPDATE movies SET loc = loc + $1
         WHERE id = $2 AND loc::bigint + $1 >= 0 AND loc::bigint + $1 <= nb_film",
    )
    .bind(delta)
    .bind(movie_id)
    .execute(&**pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(reject_counter_update(&pool, movie_id, "loc adjustment out of bounds").await);
    }

    Ok(HttpResponse::Ok().finish())
}

/// Distinguishes a bound violation (movie present, 400) from a missing
/// movie (404) after a conditional counter update touched zero rows.
async fn reject_counter_update(pool: &PgPool, movie_id: Uuid, bound_message: &str) -> AppError {
    match sqlx::query_as::<_, (i32,)>("SELECT loc FROM movies WHERE id = $1")
        .bind(movie_id)
        .fetch_optional(pool)
        .await
    {
        Ok(Some(_)) => AppError::BadRequest(bound_message.into()),
        Ok(None) => AppError::MovieNotFound,
        Err(e) => e.into(),
    }
}
