use crate::{
    database::MongoDB,
    models::{User, MAX_USERNAME_LEN},
    utils::AppError,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
};
use serde::{Deserialize, Serialize};

const DUPLICATE_KEY_CODE: i32 = 11000;

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account deletion takes the same credentials as login.
pub type DeleteAccountRequest = LoginRequest;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
}

/// Validated signup fields
#[derive(Debug, PartialEq)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub username: &'a str,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_signup(request: &SignupRequest) -> Result<NewAccount<'_>, AppError> {
    let (email, password, username) = match (
        non_empty(&request.email),
        request.password.as_deref().filter(|p| !p.is_empty()),
        non_empty(&request.username),
    ) {
        (Some(e), Some(p), Some(u)) => (e, p, u),
        _ => return Err(AppError::InvalidRequest("All fields are required".to_string())),
    };

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }

    Ok(NewAccount { email, password, username })
}

fn credentials(request: &LoginRequest) -> Result<(&str, &str), AppError> {
    match (non_empty(&request.email), request.password.as_deref().filter(|p| !p.is_empty())) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(AppError::InvalidRequest("All fields are required".to_string())),
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::DatabaseError(format!("Failed to hash password: {}", e)))
}

/// Checks a password against the stored value.
///
/// Accounts created before hashing was introduced hold the raw password;
/// anything that does not look like a bcrypt hash is compared verbatim.
pub fn password_matches(candidate: &str, stored: &str) -> bool {
    if is_bcrypt_hash(stored) {
        verify(candidate, stored).unwrap_or(false)
    } else {
        candidate == stored
    }
}

fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && (value.starts_with("$2a$") || value.starts_with("$2b$") || value.starts_with("$2y$"))
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

// Create account
pub async fn signup(db: &MongoDB, request: &SignupRequest) -> Result<MessageResponse, AppError> {
    let account = validate_signup(request)?;
    let collection = db.users();

    log::info!("📝 Trying to sign up: {}", account.username);

    if collection.find_one(doc! { "email": account.email }).await?.is_some() {
        return Err(AppError::InvalidRequest("User already exists".to_string()));
    }

    let user = User {
        id: None,
        email: account.email.to_string(),
        password: hash_password(account.password)?,
        username: account.username.to_string(),
        workouts: Vec::new(),
    };

    match collection.insert_one(&user).await {
        Ok(result) => {
            log::info!("✅ User created: {} ({})", user.email, result.inserted_id);
            Ok(MessageResponse { message: "User created".to_string() })
        }
        Err(e) if is_duplicate_key(&e) => Err(AppError::InvalidRequest("User already exists".to_string())),
        Err(e) => Err(e.into()),
    }
}

async fn authenticate(db: &MongoDB, request: &LoginRequest) -> Result<User, AppError> {
    let (email, password) = credentials(request)?;

    let user = db
        .users()
        .find_one(doc! { "email": email })
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !password_matches(password, &user.password) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    Ok(user)
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<LoginResponse, AppError> {
    let user = authenticate(db, request).await?;

    Ok(LoginResponse {
        message: "Login successful".to_string(),
        username: user.username,
    })
}

/// 🗑️ Deletes the account document, workout history included
pub async fn delete_account(db: &MongoDB, request: &DeleteAccountRequest) -> Result<MessageResponse, AppError> {
    let user = authenticate(db, request).await?;

    let result = db.users().delete_one(doc! { "email": &user.email }).await?;

    if result.deleted_count == 0 {
        log::warn!("⚠️ User {} vanished before deletion", user.email);
        return Err(AppError::NotFound("User not found".to_string()));
    }

    log::info!("✅ Account deleted: {} ({} workouts)", user.email, user.workouts.len());

    Ok(MessageResponse { message: "Account deleted".to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_request(email: &str, password: &str, username: &str) -> SignupRequest {
        SignupRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            username: Some(username.to_string()),
        }
    }

    #[test]
    fn test_validate_signup_requires_all_fields() {
        let err = validate_signup(&signup_request("", "pw", "ana")).unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");

        let missing = SignupRequest { email: Some("a@b.c".into()), password: None, username: Some("ana".into()) };
        assert!(matches!(validate_signup(&missing), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_validate_signup_username_length() {
        assert!(validate_signup(&signup_request("a@b.c", "pw", "abcdefghij")).is_ok());

        let err = validate_signup(&signup_request("a@b.c", "pw", "abcdefghijk")).unwrap_err();
        assert_eq!(err.to_string(), "Username must be at most 10 characters");

        // Counted in characters, not bytes
        assert!(validate_signup(&signup_request("a@b.c", "pw", "ñññññññññ")).is_ok());
    }

    #[test]
    fn test_validate_signup_trims_identity_fields() {
        let request = signup_request(" a@b.c ", " pw ", " ana ");
        let account = validate_signup(&request).unwrap();
        assert_eq!(account, NewAccount { email: "a@b.c", password: " pw ", username: "ana" });
    }

    #[test]
    fn test_login_requires_both_fields() {
        let request = LoginRequest { email: Some("a@b.c".into()), password: Some(String::new()) };
        assert!(matches!(credentials(&request), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_password_matches_hashed_and_legacy() {
        let hashed = hash("hunter2", 4).unwrap();
        assert!(is_bcrypt_hash(&hashed));
        assert!(password_matches("hunter2", &hashed));
        assert!(!password_matches("hunter3", &hashed));

        assert!(password_matches("plain-text", "plain-text"));
        assert!(!password_matches("plain-text", "Plain-text"));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_signup_login_delete_roundtrip() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/exercia_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();

        let email = format!("{}@example.com", uuid::Uuid::new_v4());
        signup(&db, &signup_request(&email, "pw", "tester")).await.unwrap();

        let again = signup(&db, &signup_request(&email, "pw", "tester")).await.unwrap_err();
        assert_eq!(again.to_string(), "User already exists");

        let creds = LoginRequest { email: Some(email.clone()), password: Some("pw".into()) };
        assert_eq!(login(&db, &creds).await.unwrap().username, "tester");

        delete_account(&db, &creds).await.unwrap();
        assert!(matches!(login(&db, &creds).await, Err(AppError::Unauthorized(_))));
    }
}
