//! Shared-secret bearer authentication for scheduler-triggered endpoints.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::error::ReconcilerError;

/// Proof that the request carried `Authorization: Bearer <secret>` matching
/// the configured secret exactly.
///
/// Extraction fails with [`ReconcilerError::Unauthorized`] when the header
/// is missing or malformed, when the token differs, or when no secret is
/// configured at all.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerAuth;

impl FromRequestParts<AppState> for SchedulerAuth {
    type Rejection = ReconcilerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.payout_job.config().shared_secret.as_deref();
        let provided = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        if authorize(provided, expected) {
            Ok(Self)
        } else {
            tracing::warn!(path = %parts.uri.path(), "rejected job trigger");
            Err(ReconcilerError::Unauthorized)
        }
    }
}

fn authorize(header: Option<&str>, secret: Option<&str>) -> bool {
    match (header.and_then(|h| h.strip_prefix("Bearer ")), secret) {
        (Some(token), Some(secret)) => token == secret,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_bearer_token() {
        assert!(authorize(Some("Bearer s3cret"), Some("s3cret")));
    }

    #[test]
    fn rejects_wrong_or_missing_token() {
        assert!(!authorize(Some("Bearer wrong"), Some("s3cret")));
        assert!(!authorize(None, Some("s3cret")));
        assert!(!authorize(Some("s3cret"), Some("s3cret")));
        assert!(!authorize(Some("Bearer s3cret "), Some("s3cret")));
        assert!(!authorize(Some("bearer s3cret"), Some("s3cret")));
    }

    #[test]
    fn rejects_everything_without_configured_secret() {
        assert!(!authorize(Some("Bearer "), None));
        assert!(!authorize(Some("Bearer anything"), None));
    }
}
