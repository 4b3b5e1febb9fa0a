use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fs::{File, create_dir_all};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::app::AppState;

/// A registered application user
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Stable user identifier; metric records reference this
    pub id: String,

    /// Display name
    pub name: String,

    /// Email address (unique, used for login)
    pub email: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,
}

/// Public view of a user, safe to return in responses
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Registration form data
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

/// Login form data
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

/// Authenticated identity attached to a request by `require_auth`
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// An issued bearer-token session
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub expires_at: SystemTime,
}

/// Global sessions storage
///
/// Maps opaque bearer tokens to sessions, process-wide.
lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Why a registration was rejected
///
/// Validation failures are the caller's fault; storage failures are not, and
/// the two map to different response codes.
#[derive(Debug)]
pub enum RegisterError {
    /// The submitted fields were invalid
    Invalid(String),

    /// The user store could not be read or written
    Storage(String),
}

/// JSON-file-backed store of registered users, keyed by email
///
/// Operations hold the store lock so concurrent registrations cannot
/// interleave their read-modify-write cycles (which would drop users or
/// defeat the duplicate-email check).
pub struct UserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UserStore {
    /// Open (and initialize if missing) the user store at the given path
    ///
    /// # Errors
    /// * Returns an error if the parent directory or the file cannot be created
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent)
                    .map_err(|_| "Failed to create database directory".to_string())?;
            }
        }

        if !path.exists() {
            let mut file =
                File::create(&path).map_err(|_| "Failed to create users file".to_string())?;
            file.write_all(b"{}")
                .map_err(|_| "Failed to initialize users file".to_string())?;
        }

        Ok(UserStore {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Read the users map without taking the store lock
    fn read_users(&self) -> Result<HashMap<String, User>, String> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(_) => return Err("Failed to open users file".to_string()),
        };

        let mut contents = String::new();
        if file.read_to_string(&mut contents).is_err() {
            return Err("Failed to read users file".to_string());
        }

        match serde_json::from_str(&contents) {
            Ok(users) => Ok(users),
            Err(_) => Err("Failed to parse users data".to_string()),
        }
    }

    /// Get all registered users
    ///
    /// # Errors
    /// * Returns an error if the users file cannot be opened, read, or parsed
    pub fn get_users(&self) -> Result<HashMap<String, User>, String> {
        let _guard = self.lock.lock().unwrap();
        self.read_users()
    }

    /// Save the users map to disk
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the users file, so a reader never observes a truncated document.
    fn save_users(&self, users: &HashMap<String, User>) -> Result<(), String> {
        let json = match serde_json::to_string_pretty(users) {
            Ok(json) => json,
            Err(_) => return Err("Failed to serialize users data".to_string()),
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut file = match NamedTempFile::new_in(&dir) {
            Ok(file) => file,
            Err(_) => return Err("Failed to create users file".to_string()),
        };

        if file.write_all(json.as_bytes()).is_err() {
            return Err("Failed to write users data".to_string());
        }

        if file.persist(&self.path).is_err() {
            return Err("Failed to write users data".to_string());
        }

        Ok(())
    }

    /// Register a new user
    ///
    /// # Arguments
    /// * `name` - Display name
    /// * `email` - Email address; must be well-formed and not already in use
    /// * `password` - Plain text password (hashed before storage)
    ///
    /// # Returns
    /// * `Result<User, RegisterError>` - The created user or an error
    ///
    /// # Errors
    /// * `RegisterError::Invalid` if any field is empty, the email is
    ///   malformed, or the email is already registered
    /// * `RegisterError::Storage` if the user store cannot be read or written
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<User, RegisterError> {
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(RegisterError::Invalid("All fields are required".to_string()));
        }

        if !EMAIL_RE.is_match(email) {
            return Err(RegisterError::Invalid("Invalid email format".to_string()));
        }

        let _guard = self.lock.lock().unwrap();
        let mut users = self.read_users().map_err(RegisterError::Storage)?;
        if users.contains_key(email) {
            return Err(RegisterError::Invalid(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password).map_err(RegisterError::Storage)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        };

        users.insert(email.to_string(), user.clone());
        self.save_users(&users).map_err(RegisterError::Storage)?;

        Ok(user)
    }

    /// Look up a user by email
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, String> {
        let users = self.get_users()?;
        Ok(users.get(email).cloned())
    }

    /// Verify a user's credentials
    ///
    /// # Returns
    /// * `Result<Option<User>, String>` - The user when the password matches,
    ///   `None` when it does not, or an error
    pub fn verify(&self, email: &str, password: &str) -> Result<Option<User>, String> {
        let users = self.get_users()?;

        if let Some(user) = users.get(email) {
            if verify_password(password, &user.password_hash)? {
                return Ok(Some(user.clone()));
            }
        }

        Ok(None)
    }
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err("Password hashing failed".to_string()),
    }
}

/// Verify a password against a stored hash
fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err("Invalid password hash format".to_string()),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

/// Create a new session and return its opaque bearer token
pub fn create_session(user: &User) -> String {
    let token = Uuid::new_v4().to_string();
    let expires_at = SystemTime::now() + Duration::from_secs(SESSION_DURATION);

    let session = Session {
        user_id: user.id.clone(),
        email: user.email.clone(),
        expires_at,
    };

    let mut sessions = SESSIONS.write().unwrap();
    sessions.insert(token.clone(), session);

    token
}

/// Validate a bearer token
///
/// # Returns
/// * `Option<AuthUser>` - The identity for the token if it is known and not
///   expired, `None` otherwise
pub fn validate_session(token: &str) -> Option<AuthUser> {
    let sessions = SESSIONS.read().unwrap();

    if let Some(session) = sessions.get(token) {
        if session.expires_at > SystemTime::now() {
            return Some(AuthUser {
                id: session.user_id.clone(),
                email: session.email.clone(),
            });
        }
    }

    None
}

// Web handler functions below

/// Handle user registration
///
/// # Returns
/// * `Response` - 201 with the created profile, or 400 with the reason
pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    log::info!("Received registration request for {}", payload.email);

    match state
        .users
        .register(&payload.name, &payload.email, &payload.password)
    {
        Ok(user) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "User registered successfully",
                "user": UserProfile::from(&user),
            })),
        )
            .into_response(),
        Err(RegisterError::Invalid(message)) => {
            log::warn!("Registration rejected for {}: {}", payload.email, message);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response()
        }
        Err(RegisterError::Storage(message)) => {
            log::error!("Registration failed for {}: {}", payload.email, message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response()
        }
    }
}

/// Handle user login
///
/// Issues an opaque bearer token on success.
///
/// # Returns
/// * `Response` - 200 with `{token, message, user}`, 400 for missing fields
///   or an unknown email, 401 for a wrong password
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Response {
    if payload.email.is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "All fields are required" })),
        )
            .into_response();
    }

    match state.users.verify(&payload.email, &payload.password) {
        Ok(Some(user)) => {
            let token = create_session(&user);
            (
                StatusCode::OK,
                Json(json!({
                    "token": token,
                    "message": "User logged in",
                    "user": UserProfile::from(&user),
                })),
            )
                .into_response()
        }
        Ok(None) => match state.users.find_by_email(&payload.email) {
            Ok(None) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "No user found" })),
            )
                .into_response(),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid credentials" })),
            )
                .into_response(),
        },
        Err(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": message })),
        )
            .into_response(),
    }
}

/// Authentication middleware for metric routes
///
/// Reads `Authorization: Bearer <token>`, validates the session, and inserts
/// the `AuthUser` identity as a request extension.
///
/// # Returns
/// * `Response` - Passes the request through, or 401 with a message
pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.to_string());

    let token = match token {
        Some(token) => token,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthorized" })),
            )
                .into_response();
        }
    };

    match validate_session(&token) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid token" })),
        )
            .into_response(),
    }
}
