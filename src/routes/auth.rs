use axum::extract::{Extension, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;
use utoipa::IntoParams;

use crate::auth::MaybeUser;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::extract::{AppJson, AppPath, AppQuery};
use crate::core::response::{BaseResponse, EnvelopeDoc, ErrorDoc};
use crate::dto::auth::{AuthResponse, LoginDto, RegisterDto};
use crate::dto::user::UserDto;
use crate::gateway::state::AppState;
use crate::i18n::Lang;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/:provider", get(oauth_redirect))
        .route("/auth/:provider/callback", get(oauth_callback))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterDto,
    responses(
        (status = 200, description = "Account created", body = EnvelopeDoc),
        (status = 400, description = "Invalid registration data", body = ErrorDoc),
        (status = 409, description = "Email already registered", body = ErrorDoc)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Extension(lang): Extension<Lang>,
    AppJson(dto): AppJson<RegisterDto>,
) -> GatewayResult<BaseResponse<UserDto>> {
    state.services.auth.register(dto, lang).await
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Logged in, access token cookie set", body = EnvelopeDoc),
        (status = 401, description = "Invalid credentials", body = ErrorDoc)
    )
)]
pub async fn login(State(state): State<AppState>, AppJson(dto): AppJson<LoginDto>) -> GatewayResult<Response> {
    let response: BaseResponse<AuthResponse> = state.services.auth.login(dto).await?;
    let cookie = state.cookies.session(&response.data.access_token)?;
    Ok(([(SET_COOKIE, cookie)], response).into_response())
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses((status = 200, description = "Access token cookie cleared", body = EnvelopeDoc))
)]
pub async fn logout(State(state): State<AppState>) -> GatewayResult<Response> {
    let cookie = state.cookies.cleared()?;
    Ok(([(SET_COOKIE, cookie)], state.services.auth.logout()).into_response())
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer" = []), ("cookie" = [])),
    responses(
        (status = 200, description = "Current user", body = EnvelopeDoc),
        (status = 401, description = "Not logged in", body = ErrorDoc)
    )
)]
pub async fn me(State(state): State<AppState>, user: MaybeUser) -> GatewayResult<BaseResponse<UserDto>> {
    state.services.auth.me(user.id()).await
}

#[utoipa::path(
    get,
    path = "/auth/{provider}",
    tag = "auth",
    params(("provider" = String, Path, description = "facebook, google or twitter")),
    responses(
        (status = 303, description = "Redirect to the provider's consent page"),
        (status = 404, description = "Provider not configured", body = ErrorDoc)
    )
)]
pub async fn oauth_redirect(State(state): State<AppState>, AppPath(provider): AppPath<String>) -> GatewayResult<Redirect> {
    let url = state.oauth.authorize_url(&provider).await?;
    Ok(Redirect::to(url.as_str()))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user declines
    pub error: Option<String>,
}

/// Finish the login and send the browser back to the storefront
///
/// Failures redirect too, with `status=failed` and the message key in `reason`,
/// since the caller is a browser navigation rather than an API client.
#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    tag = "auth",
    params(
        ("provider" = String, Path, description = "facebook, google or twitter"),
        OAuthCallbackQuery
    ),
    responses((status = 303, description = "Redirect to the storefront, access token cookie set on success"))
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    AppPath(provider): AppPath<String>,
    AppQuery(query): AppQuery<OAuthCallbackQuery>,
) -> Response {
    match complete_oauth(&state, &provider, query).await {
        Ok(token) => match state.cookies.session(&token) {
            Ok(cookie) => {
                info!(provider = %provider, "OAuth login completed");
                ([(SET_COOKIE, cookie)], Redirect::to(&storefront_url(&state, "success", None))).into_response()
            }
            Err(e) => e.into_response(),
        },
        Err(e) => {
            warn!(provider = %provider, error = %e, "OAuth login failed");
            Redirect::to(&storefront_url(&state, "failed", Some(e.message_key()))).into_response()
        }
    }
}

async fn complete_oauth(state: &AppState, provider: &str, query: OAuthCallbackQuery) -> GatewayResult<String> {
    if let Some(error) = query.error {
        return Err(GatewayError::oauth(format!("Provider returned error: {}", error)));
    }
    let (Some(code), Some(csrf)) = (query.code, query.state) else {
        return Err(GatewayError::unauthorized("auth.errors.invalidOauthState"));
    };

    let profile = state.oauth.callback(provider, &code, &csrf).await?;
    let response = state.services.auth.oauth_login(profile).await?;
    Ok(response.data.access_token)
}

fn storefront_url(state: &AppState, status: &str, reason: Option<&str>) -> String {
    let base = format!("{}/auth/callback", state.frontend_url.trim_end_matches('/'));
    let Ok(mut url) = Url::parse(&base) else {
        return base;
    };
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("status", status);
        if let Some(reason) = reason {
            query.append_pair("reason", reason);
        }
    }
    url.to_string()
}
