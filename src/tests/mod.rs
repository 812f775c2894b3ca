mod account;
mod store;

use axum::http;
use hyper::{Body, Request};
use tower::ServiceExt;

/// Reset all static instances.
fn reset_all() {
    crate::account::CREDENTIALS.reset();
    crate::account::INSTANCE.reset();
    crate::account::session::INSTANCE.reset();
    crate::issue::INSTANCE.reset();
    crate::issue::cache::INSTANCE.reset();
    crate::optout::INSTANCE.reset();
    crate::rating::INSTANCE.reset();
    crate::update::INSTANCE.reset();
}

/// Build a JSON POST request against the router.
fn post_json<T: serde::Serialize>(uri: &str, token: Option<&str>, body: &T) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(token) = token {
        builder = builder.header("Token", token);
    }
    builder
        .body(serde_json::to_vec(body).unwrap().into())
        .unwrap()
}

/// Collect a response body as JSON.
async fn response_json<B>(response: http::Response<B>) -> serde_json::Value
where
    B: axum::body::HttpBody,
    B::Error: std::fmt::Debug,
{
    serde_json::from_slice(&hyper::body::to_bytes(response.into_body()).await.unwrap()).unwrap()
}

/// Register the default student and return their session token.
async fn student_token(app: &axum::Router) -> String {
    use messbuddy_shared::account::handle::SignupDescriptor;

    let descriptor = SignupDescriptor {
        name: "Asha Patil".to_string(),
        email: "a@b.com".to_string(),
        password: "secret1".to_string(),
        division: "A".to_string(),
        roll: 12,
        prn: "12345678901234".to_string(),
        batch: 2026,
    };

    let response = app
        .clone()
        .oneshot(post_json("/api/account/signup", None, &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), hyper::StatusCode::OK);

    let json = response_json(response).await;
    json["token"].as_str().unwrap().to_string()
}

/// Seed the sample accounts and log into one, returning its token.
async fn mess_token(app: &axum::Router) -> String {
    use messbuddy_shared::account::handle::LoginDescriptor;

    crate::account::INSTANCE.ensure_seeded().await.unwrap();

    let descriptor = LoginDescriptor {
        account: "mess_a".to_string(),
        password: "SIMS2025".to_string(),
    };

    let response = app
        .clone()
        .oneshot(post_json("/api/account/login", None, &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), hyper::StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["role"], "mess");
    json["token"].as_str().unwrap().to_string()
}
