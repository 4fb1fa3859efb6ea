use axum::{
    Extension, Json,
    extract::{Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::guard::{self, RouteAccess, RouteDecision};

/// Identity forwarded by the auth proxy, available to protected handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessQueryKind {
    Public,
    Protected,
    Entry,
}

impl From<AccessQueryKind> for RouteAccess {
    fn from(kind: AccessQueryKind) -> Self {
        match kind {
            AccessQueryKind::Public => Self::Public,
            AccessQueryKind::Protected => Self::Protected,
            AccessQueryKind::Entry => Self::Entry,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DecisionQuery {
    pub access: AccessQueryKind,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub user: Option<String>,
    pub decision: RouteDecision,
}

fn forwarded_user(headers: &HeaderMap, header_name: &str) -> Option<CurrentUser> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(|user| CurrentUser(user.to_string()))
}

/// Lets a request through only if the guard allows the forwarded identity on
/// a protected route.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let user = forwarded_user(request.headers(), &state.user_header);

    match guard::decide(user.as_ref(), false, RouteAccess::Protected) {
        RouteDecision::Allow => {
            if let Some(user) = user {
                tracing::Span::current().record("user_id", user.name());
                request.extensions_mut().insert(user);
            }
            Ok(next.run(request).await)
        }
        RouteDecision::Pending | RouteDecision::Redirect(_) => {
            Err(ApiError::Unauthorized("Authentication required".to_string()))
        }
    }
}

/// GET /auth/decision?access=protected
/// Tells a client where the forwarded identity may go.
pub async fn route_decision(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DecisionQuery>,
) -> Json<ApiResponse<DecisionResponse>> {
    let user = forwarded_user(&headers, &state.user_header);
    let decision = guard::decide(user.as_ref(), false, query.access.into());

    Json(ApiResponse::success(DecisionResponse {
        user: user.map(|u| u.0),
        decision,
    }))
}

/// GET /auth/me
pub async fn get_current_user(
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<String>> {
    Json(ApiResponse::success(user.0))
}
