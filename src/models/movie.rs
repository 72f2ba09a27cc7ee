use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Fields managed by the server. They can never be set or overwritten
/// through a request body.
const RESERVED_FIELDS: &[&str] = &["id", "added_by", "created_at"];

/// A movie in the rental stock.
///
/// The schema is open: beyond the typed columns, callers may attach
/// arbitrary JSON fields (director, year, genre, ...) which live in the
/// `extra` bag and are flattened into the API representation.
///
/// Invariant: `0 <= loc <= nb_film` holds after every counter mutation.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Movie {
    /// Unique identifier (UUID v4).
    pub id: Uuid,
    /// Title of the movie. Unique across the stock.
    pub title: String,
    /// Total number of copies owned.
    #[serde(rename = "nbFilm")]
    pub nb_film: i32,
    /// Number of copies currently on loan.
    pub loc: i32,
    /// Id of the user who added the movie; governs update/delete rights.
    pub added_by: Uuid,
    /// Open extension bag for caller-supplied fields.
    #[serde(flatten)]
    pub extra: Json<Map<String, Value>>,
    /// Timestamp of when the movie was added to the stock.
    pub created_at: DateTime<Utc>,
}

/// Input structure for creating a movie.
///
/// Unknown fields are accepted and collected into `extra`; the reserved
/// server-managed fields are rejected at the boundary.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct MovieInput {
    /// The title of the movie. Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Total number of copies owned. Defaults to 0.
    #[serde(rename = "nbFilm", default)]
    #[validate(range(min = 0))]
    pub nb_film: i32,

    /// Number of copies currently on loan. Defaults to 0, may not exceed
    /// `nb_film`.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub loc: i32,

    /// Any additional caller-supplied fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieInput {
    /// Boundary validation beyond the derived field checks: counter
    /// invariant and reserved-field rejection.
    pub fn validate_input(&self) -> Result<(), AppError> {
        self.validate()?;
        if self.loc > self.nb_film {
            return Err(AppError::SchemaValidation);
        }
        if self.extra.keys().any(|k| RESERVED_FIELDS.contains(&k.as_str())) {
            return Err(AppError::SchemaValidation);
        }
        Ok(())
    }
}

impl Movie {
    /// Creates a new `Movie` from validated input, owned by `added_by`.
    pub fn new(input: MovieInput, added_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            nb_film: input.nb_film,
            loc: input.loc,
            added_by,
            extra: Json(input.extra),
            created_at: Utc::now(),
        }
    }

    /// Applies a partial update to this movie.
    ///
    /// Typed keys (`title`, `nbFilm`, `loc`) must carry values of the right
    /// type; reserved fields may not appear; every other key is upserted
    /// into the extension bag. Fails with a schema error if the patch is
    /// malformed or would leave `loc > nbFilm`.
    pub fn apply_patch(&mut self, patch: Map<String, Value>) -> Result<(), AppError> {
        for (key, value) in patch {
            match key.as_str() {
                "title" => {
                    let title = value.as_str().ok_or(AppError::SchemaValidation)?;
                    // Character count, matching the create-path length rule.
                    if title.is_empty() || title.chars().count() > 200 {
                        return Err(AppError::SchemaValidation);
                    }
                    self.title = title.to_string();
                }
                "nbFilm" => self.nb_film = int_field(&value)?,
                "loc" => self.loc = int_field(&value)?,
                key if RESERVED_FIELDS.contains(&key) => {
                    return Err(AppError::SchemaValidation);
                }
                _ => {
                    self.extra.0.insert(key, value);
                }
            }
        }
        if self.loc < 0 || self.loc > self.nb_film {
            return Err(AppError::SchemaValidation);
        }
        Ok(())
    }
}

fn int_field(value: &Value) -> Result<i32, AppError> {
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(AppError::SchemaValidation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn input(title: &str, nb_film: i32, loc: i32) -> MovieInput {
        MovieInput {
            title: title.to_string(),
            nb_film,
            loc,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_movie_creation() {
        let owner = Uuid::new_v4();
        let mut movie_input = input("Le Samouraï", 5, 2);
        movie_input
            .extra
            .insert("director".into(), json!("Jean-Pierre Melville"));

        let movie = Movie::new(movie_input, owner);
        assert_eq!(movie.title, "Le Samouraï");
        assert_eq!(movie.nb_film, 5);
        assert_eq!(movie.loc, 2);
        assert_eq!(movie.added_by, owner);
        assert_eq!(movie.extra.0["director"], "Jean-Pierre Melville");
    }

    #[test]
    fn test_input_validation() {
        assert!(input("Valid Title", 3, 0).validate_input().is_ok());

        // Empty title
        assert!(input("", 3, 0).validate_input().is_err());

        // More copies on loan than owned
        assert!(input("Valid Title", 2, 3).validate_input().is_err());

        // Negative counters
        assert!(input("Valid Title", -1, 0).validate_input().is_err());

        // Reserved field in the extension bag
        let mut bad = input("Valid Title", 3, 0);
        bad.extra.insert("added_by".into(), json!("someone-else"));
        assert!(bad.validate_input().is_err());
    }

    #[test]
    fn test_open_schema_deserialization() {
        let movie_input: MovieInput = serde_json::from_value(json!({
            "title": "Cléo de 5 à 7",
            "nbFilm": 4,
            "year": 1962,
            "director": "Agnès Varda"
        }))
        .unwrap();

        assert_eq!(movie_input.nb_film, 4);
        assert_eq!(movie_input.loc, 0);
        assert_eq!(movie_input.extra["year"], 1962);
        assert_eq!(movie_input.extra["director"], "Agnès Varda");
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let result: Result<MovieInput, _> = serde_json::from_value(json!({
            "nbFilm": 4
        }));
        assert!(result.is_err(), "title is required");
    }

    #[test]
    fn test_apply_patch() {
        let mut movie = Movie::new(input("Playtime", 5, 1), Uuid::new_v4());

        let patch = json!({"loc": 3, "year": 1967})
            .as_object()
            .cloned()
            .unwrap();
        movie.apply_patch(patch).unwrap();
        assert_eq!(movie.loc, 3);
        assert_eq!(movie.extra.0["year"], 1967);

        // Wrong type for a typed key
        let patch = json!({"nbFilm": "five"}).as_object().cloned().unwrap();
        assert!(movie.apply_patch(patch).is_err());

        // Reserved field
        let patch = json!({"added_by": "intruder"}).as_object().cloned().unwrap();
        assert!(movie.apply_patch(patch).is_err());

        // Patch breaking the counter invariant
        let patch = json!({"loc": 9}).as_object().cloned().unwrap();
        assert!(movie.apply_patch(patch).is_err());
    }

    #[test]
    fn test_patch_title_length_counts_characters() {
        let mut movie = Movie::new(input("Mon Oncle", 2, 0), Uuid::new_v4());

        // 150 accented characters is 300 bytes but still within the
        // 200-character bound, same as at creation.
        let accented = "é".repeat(150);
        let patch = json!({ "title": accented }).as_object().cloned().unwrap();
        assert!(movie.apply_patch(patch).is_ok());
        assert_eq!(movie.title.chars().count(), 150);

        let too_long = "é".repeat(201);
        let patch = json!({ "title": too_long }).as_object().cloned().unwrap();
        assert!(movie.apply_patch(patch).is_err());
    }

    #[test]
    fn test_api_representation_flattens_extra() {
        let mut movie_input = input("Band of Outsiders", 2, 0);
        movie_input.extra.insert("year".into(), json!(1964));
        let movie = Movie::new(movie_input, Uuid::new_v4());

        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["title"], "Band of Outsiders");
        assert_eq!(json["nbFilm"], 2);
        assert_eq!(json["year"], 1964);
        assert!(json.get("extra").is_none());
    }
}
