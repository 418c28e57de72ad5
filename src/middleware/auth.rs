use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_RECEPTIONIST: &str = "receptionist";
pub const ROLE_ACCOUNTANT: &str = "accountant";
pub const ROLE_CASHIER: &str = "cashier";

pub const STAFF_ROLES: &[&str] = &[
    ROLE_ADMIN,
    ROLE_MANAGER,
    ROLE_RECEPTIONIST,
    ROLE_ACCOUNTANT,
    ROLE_CASHIER,
];
/// Roles allowed to run the front desk: bookings, check-in, check-out.
pub const FRONT_DESK_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_RECEPTIONIST];
/// Roles allowed to edit invoices and read revenue.
pub const BILLING_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_ACCOUNTANT];
/// Roles allowed to take payments.
pub const CASHIER_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_ACCOUNTANT, ROLE_CASHIER];

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

pub fn ensure_any_role(user: &AuthUser, roles: &[&str]) -> Result<(), AppError> {
    if !roles.contains(&user.role.as_str()) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_any_role(user, &[ROLE_ADMIN])
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    ensure_any_role(user, STAFF_ROLES)
}

fn decode_bearer(auth_header: &header::HeaderValue, secret: &str) -> Result<AuthUser, AppError> {
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::BadRequest("Invalid Authorization scheme".into()))?
        .trim();

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;
        decode_bearer(auth_header, &state.config.jwt_secret)
    }
}

/// Guest paths accept a missing header; a present but invalid one is still
/// rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match parts.headers.get(header::AUTHORIZATION) {
            Some(value) => decode_bearer(value, &state.config.jwt_secret).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: role.into(),
        }
    }

    #[test]
    fn role_groups() {
        assert!(ensure_any_role(&user(ROLE_RECEPTIONIST), FRONT_DESK_ROLES).is_ok());
        assert!(ensure_any_role(&user(ROLE_CASHIER), FRONT_DESK_ROLES).is_err());
        assert!(ensure_any_role(&user(ROLE_CASHIER), CASHIER_ROLES).is_ok());
        assert!(ensure_admin(&user(ROLE_MANAGER)).is_err());
        assert!(ensure_staff(&user("guest")).is_err());
    }
}

/// Header carrying the payment provider's shared secret.
pub const NOTIFY_SECRET_HEADER: &str = "x-payment-notify-secret";

/// A payment-status callback whose shared secret matched the configured one.
#[derive(Debug, Clone, Copy)]
pub struct PaymentNotifier;

/// Byte comparison that does not stop at the first difference.
fn secrets_match(given: &[u8], expected: &[u8]) -> bool {
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

pub fn verify_notify_secret(headers: &HeaderMap, expected: &str) -> Result<PaymentNotifier, AppError> {
    let given = headers
        .get(NOTIFY_SECRET_HEADER)
        .ok_or(AppError::Unauthorized)?;
    if expected.is_empty() || !secrets_match(given.as_bytes(), expected.as_bytes()) {
        return Err(AppError::Forbidden);
    }
    Ok(PaymentNotifier)
}

impl FromRequestParts<AppState> for PaymentNotifier {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        verify_notify_secret(&parts.headers, &state.config.payment_notify_secret).inspect_err(|_| {
            tracing::warn!("payment notification rejected: bad or missing secret");
        })
    }
}

#[cfg(test)]
mod notify_tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(secret: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(NOTIFY_SECRET_HEADER, HeaderValue::from_str(secret).unwrap());
        headers
    }

    #[test]
    fn notify_secret_must_match() {
        assert!(matches!(
            verify_notify_secret(&HeaderMap::new(), "s3cret"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            verify_notify_secret(&headers_with("s3cre"), "s3cret"),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            verify_notify_secret(&headers_with("s3crex"), "s3cret"),
            Err(AppError::Forbidden)
        ));
        assert!(verify_notify_secret(&headers_with("s3cret"), "s3cret").is_ok());
    }

    #[test]
    fn empty_configured_secret_accepts_nothing() {
        assert!(matches!(
            verify_notify_secret(&headers_with(""), ""),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn staff_role_groups() {
        let cashier = AuthUser {
            user_id: Uuid::new_v4(),
            role: ROLE_CASHIER.into(),
        };
        assert!(ensure_staff(&cashier).is_ok());
        assert!(ensure_any_role(&cashier, CASHIER_ROLES).is_ok());
        assert!(matches!(ensure_any_role(&cashier, BILLING_ROLES), Err(AppError::Forbidden)));
        assert!(matches!(ensure_admin(&cashier), Err(AppError::Forbidden)));
    }
}
