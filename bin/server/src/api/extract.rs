//! Request extractors: the session-resolved actor and client context.

use amber_ward_access::Actor;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::api::AppState;
use crate::db::{ActorRepository, SessionRepository};
use crate::error::ApiError;
use crate::service::ClientMeta;

/// Session cookie name.
const SESSION_COOKIE: &str = "session";

/// Extractor resolving the session cookie into the acting [`Actor`].
///
/// There is no ambient identity anywhere below this point; handlers pass
/// the actor explicitly into the service layer.
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthenticated)?;

        let session_cookie = jar.get(SESSION_COOKIE).ok_or(ApiError::Unauthenticated)?;

        let session_repo = SessionRepository::new(app_state.db_pool.clone());
        let session = session_repo
            .find_by_id(session_cookie.value())
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        if session.is_expired() {
            return Err(ApiError::Unauthenticated);
        }

        let actor_repo = ActorRepository::new(app_state.db_pool.clone());
        let actor = actor_repo
            .find_by_id(session.actor_id)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        Ok(CurrentActor(actor))
    }
}

/// Extractor capturing client IP and user agent for audit entries.
pub struct ClientInfo(pub ClientMeta);

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        // Behind the reverse proxy the first forwarded hop is the client.
        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()));

        Ok(ClientInfo(ClientMeta {
            ip_address,
            user_agent: header("user-agent"),
        }))
    }
}
