pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::AuthenticatedUserId;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims, JwtKeys};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// User's email address.
    pub email: String,
    /// User's password.
    pub password: String,
}

/// Represents the payload for a new account signup request.
///
/// The user schema is closed, so unknown fields fail deserialization and
/// surface as a schema error.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    /// Email address for the new account.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Response body for a successful signup: the id of the new user.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub id: uuid::Uuid,
}

/// Response body for a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The JWT bearer token for subsequent requests.
    pub token: String,
}
