//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use history_core::error::CoreError;
use history_core::roles::ROLE_OWNER;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `owner` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn owner_only(RequireOwner(user): RequireOwner) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireOwner(pub AuthUser);

impl FromRequestParts<AppState> for RequireOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_OWNER {
            return Err(AppError::Core(CoreError::Forbidden(
                "Owner role required".into(),
            )));
        }
        Ok(RequireOwner(user))
    }
}
