use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user as stored in the database.
///
/// `movies` is the ordered list of ids of the movies this user added to the
/// stock. References are weak: deleting a movie does not scrub the list.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Bcrypt hash of the password. Plaintext is never stored, and the hash
    /// is never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub movies: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new `User` row from an email and an already-hashed
    /// password, with a fresh id and an empty movie list.
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            movies: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
