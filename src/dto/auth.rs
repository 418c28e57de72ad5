use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// New staff account. `role` is one of admin, manager, receptionist,
/// accountant or cashier.
#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "frontdesk@resort.test")]
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    #[schema(example = "receptionist")]
    pub role: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// `Bearer <jwt>`, ready for the `Authorization` header.
    pub token: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT payload: `sub` is the staff user id.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
