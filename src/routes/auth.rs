use crate::{
    auth::{
        generate_token, hash_password, verify_password, JwtKeys, LoginRequest, SignupRequest,
        SignupResponse, TokenResponse,
    },
    error::{is_unique_violation, AppError},
    models::User,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Sign up a new user
///
/// Creates a user account with a bcrypt-hashed password and returns the new
/// user's id. A second signup with the same email is rejected with 409.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    signup_data: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    signup_data.validate()?;

    let signup_data = signup_data.into_inner();
    let password_hash = hash_password(&signup_data.password)?;
    let user = User::new(signup_data.email, password_hash);

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, movies, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.movies)
    .bind(user.created_at)
    .execute(&**pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::EmailAlreadyExists
        } else {
            e.into()
        }
    })?;

    Ok(HttpResponse::Ok().json(SignupResponse { id: user.id }))
}

/// Log in
///
/// Authenticates by email and password, and returns a bearer token valid
/// for 7 days. A missing user and a wrong password are indistinguishable to
/// the caller: both answer 401.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    keys: web::Data<JwtKeys>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let user = sqlx::query_as::<_, (uuid::Uuid, String)>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some((user_id, password_hash)) => {
            if verify_password(&login_data.password, &password_hash)? {
                let token = generate_token(&keys, user_id)?;
                Ok(HttpResponse::Ok().json(TokenResponse { token }))
            } else {
                Err(AppError::Unauthorized)
            }
        }
        None => Err(AppError::Unauthorized),
    }
}
