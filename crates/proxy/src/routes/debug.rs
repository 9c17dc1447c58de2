//! Session inspection for troubleshooting installs.
//!
//! Only mounted when `PROXY_DEBUG_ROUTES=true`. Requests must carry a valid
//! app proxy signature and name their shop. Access tokens are masked.

use axum::{
    Json,
    extract::{RawQuery, State},
};
use secrecy::ExposeSecret;
use serde::Serialize;
use stock_proxy_core::ShopDomain;
use tracing::instrument;

use super::{request_shop, verified_request};
use crate::error::{AppError, Result};
use crate::sessions::StoredSession;
use crate::state::AppState;

/// Characters of the token left visible at the end.
const VISIBLE_SUFFIX: usize = 4;

/// Sessions stored for one shop.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub shop: ShopDomain,
    pub token_strategy: String,
    pub sessions: Vec<SessionSummary>,
}

/// One stored session with its token masked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub is_online: bool,
    pub scope: Option<String>,
    pub has_access_token: bool,
    pub access_token: String,
}

impl From<&StoredSession> for SessionSummary {
    fn from(session: &StoredSession) -> Self {
        let token = session.access_token.expose_secret();
        Self {
            id: session.id.clone(),
            is_online: session.is_online,
            scope: session.scope.clone(),
            has_access_token: !token.is_empty(),
            access_token: mask_token(token),
        }
    }
}

/// List the stored sessions for `shop`.
#[instrument(skip(state, query))]
pub async fn sessions(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SessionsResponse>> {
    let request = verified_request(&state, query.as_deref())?;
    let shop = request_shop(&state, &request, true)?;

    let sessions = state
        .sessions()
        .find_by_shop(&shop)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to load sessions: {e}")))?;

    Ok(Json(SessionsResponse {
        shop,
        token_strategy: format!("{:?}", state.tokens().kind()),
        sessions: sessions.iter().map(SessionSummary::from).collect(),
    }))
}

/// Mask all but the last few characters of a token.
fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    if len <= VISIBLE_SUFFIX * 2 {
        return "*".repeat(len);
    }

    let suffix: String = token.chars().skip(len - VISIBLE_SUFFIX).collect();
    format!("{}{suffix}", "*".repeat(len - VISIBLE_SUFFIX))
}
