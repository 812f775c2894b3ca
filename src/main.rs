mod account;
pub(crate) mod config;
mod issue;
mod optout;
mod rating;
mod store;
mod update;

/// The module for unit testing, will only be availabled in dev env.
#[cfg(test)]
mod tests;

use axum::{async_trait, http::StatusCode, routing::post, Json};
use serde_json::json;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // create-if-absent seeding of the mess login records
    if let Err(err) = account::INSTANCE.ensure_seeded().await {
        tracing::error!("failed to seed mess accounts: {err}");
    }

    // router lives in a free function so tests can construct it too
    let app = router();

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config::INSTANCE.server.port));
    tracing::info!("listening on {addr}");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}

/// Construct a router.
fn router() -> axum::Router {
    axum::Router::new()
        // account
        .route("/api/account/signup", post(account::handle::signup))
        .route("/api/account/login", post(account::handle::login))
        .route("/api/account/logout", post(account::handle::logout))
        .route("/api/account/view", post(account::handle::view_profile))
        .route(
            "/api/account/change-password",
            post(account::handle::change_password),
        )
        .route(
            "/api/account/reset-password",
            post(account::handle::reset_password),
        )
        .route("/api/account/signout", post(account::handle::sign_out))
        // issues
        .route("/api/issue/upload-media", post(issue::handle::upload_media))
        .route("/api/issue/get-media", post(issue::handle::get_media))
        .route("/api/issue/raise", post(issue::handle::raise_issue))
        .route("/api/issue/get", post(issue::handle::get_issues))
        .route("/api/issue/get-info", post(issue::handle::get_issues_info))
        .route("/api/issue/edit", post(issue::handle::edit_issue))
        .route("/api/issue/advance", post(issue::handle::advance_issue))
        // opt-outs
        .route("/api/optout/submit", post(optout::handle::submit_opt_out))
        .route("/api/optout/get", post(optout::handle::get_opt_outs))
        .route("/api/optout/overview", post(optout::handle::overview))
        // updates
        .route("/api/update/post", post(update::handle::post_update))
        .route("/api/update/get", post(update::handle::get_updates))
        // ratings
        .route("/api/rating/submit", post(rating::handle::submit_rating))
        .route("/api/rating/get", post(rating::handle::get_ratings))
}

/// Maps a module error to the status code of its response.
pub trait AsResCode {
    fn response_code(&self) -> StatusCode;
}

/// Wrapper turning a module error into a JSON error response.
pub struct ResError<E>(pub E);

impl<E> axum::response::IntoResponse for ResError<E>
where
    E: AsResCode + std::fmt::Display,
{
    fn into_response(self) -> axum::response::Response {
        (
            self.0.response_code(),
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

/// A context resolving the session of the account performing a request.
pub struct RequireAuthContext {
    /// The access token of this session.
    pub token: String,
    /// Who the token belongs to.
    pub identity: account::session::Identity,
}

impl RequireAuthContext {
    /// The student email behind this context.
    pub fn require_student(&self) -> Result<&str, account::Error> {
        match &self.identity {
            account::session::Identity::Student(email) => Ok(email),
            _ => Err(account::Error::PermissionDenied),
        }
    }

    /// The mess username behind this context.
    pub fn require_mess(&self) -> Result<&str, account::Error> {
        match &self.identity {
            account::session::Identity::Mess(username) => Ok(username),
            _ => Err(account::Error::PermissionDenied),
        }
    }
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequireAuthContext {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let token = if let Some(value) = parts.headers.get("Token") {
            value.to_str().unwrap_or_default().to_string()
        } else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "no valid token field found in headers" })),
            ));
        };

        match account::session::INSTANCE.resolve(&token) {
            Some(identity) => Ok(Self { token, identity }),
            None => Err((
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "not logged in" })),
            )),
        }
    }
}
