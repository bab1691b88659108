use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::config::PortalRoutesConfig;
use super::cookies;
use super::error::PortalError;
use super::extractor::RequireCredential;
use super::guard::protect;
use super::state::PortalState;
use crate::executor::{ProblemSummary, ProblemTemplate};
use crate::types::{Language, ProblemSlug};

/// Create the portal router: `/logout` plus the guarded problem-set data routes.
pub fn portal_routes(config: PortalRoutesConfig) -> Router {
    let prefix = config.guard.protected_prefix.clone();

    let state = PortalState {
        executor: Arc::new(config.executor),
        guard: config.guard,
        logout_redirect: config.logout_redirect,
    };

    let router = Router::new()
        .route("/logout", get(logout).post(logout))
        .route(&prefix, get(problem_list))
        .route(&format!("{prefix}/{{slug}}"), get(problem_detail));

    protect(router, state.guard.clone()).with_state(state)
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(State(state): State<PortalState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let clear = cookies::clear_credential_cookie(&state.guard.credential_cookie);
    tracing::info!("Credential cookie cleared");
    (jar.add(clear), Redirect::to(&state.logout_redirect))
}

// ── Problem set ────────────────────────────────────────────────────

async fn problem_list(
    State(state): State<PortalState>,
    RequireCredential(credential): RequireCredential,
) -> Result<Json<Vec<ProblemSummary>>, PortalError> {
    state
        .executor
        .list_problems(&credential)
        .await
        .map(Json)
        .map_err(|e| PortalError::from_client(e, &state.guard))
}

#[derive(Deserialize)]
struct DetailParams {
    lang: Option<String>,
}

async fn problem_detail(
    State(state): State<PortalState>,
    RequireCredential(credential): RequireCredential,
    Path(slug): Path<String>,
    Query(params): Query<DetailParams>,
) -> Result<Json<ProblemTemplate>, PortalError> {
    let slug: ProblemSlug = slug
        .parse()
        .map_err(|e| PortalError::from_client(e, &state.guard))?;
    let language = match params.lang.as_deref() {
        Some(lang) => lang
            .parse::<Language>()
            .map_err(|e| PortalError::from_client(e, &state.guard))?,
        None => Language::Python,
    };

    state
        .executor
        .problem_template(&slug, language, &credential)
        .await
        .map(Json)
        .map_err(|e| PortalError::from_client(e, &state.guard))
}
