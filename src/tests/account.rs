use hyper::StatusCode;
use serial_test::serial;
use tower::ServiceExt;

use messbuddy_shared::account::handle::*;

use super::{mess_token, post_json, reset_all, response_json, student_token};

fn signup_descriptor() -> SignupDescriptor {
    SignupDescriptor {
        name: "Asha Patil".to_string(),
        email: "a@b.com".to_string(),
        password: "secret1".to_string(),
        division: "A".to_string(),
        roll: 12,
        prn: "12345678901234".to_string(),
        batch: 2026,
    }
}

#[serial]
#[tokio::test]
async fn signup_then_login_with_case_varied_email() {
    reset_all();

    let app = crate::router();
    student_token(&app).await;

    // the record landed in the cell with a digested password
    let creds = crate::account::CREDENTIALS.get().unwrap();
    assert_eq!(creds.email, "a@b.com");
    assert_eq!(creds.password, sha256::digest("secret1"));

    let descriptor = LoginDescriptor {
        account: "A@B.com".to_string(),
        password: "secret1".to_string(),
    };
    let response = app
        .oneshot(post_json("/api/account/login", None, &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["role"], "student");
    assert!(json["token"].is_string());
}

#[serial]
#[tokio::test]
async fn signup_rejects_duplicate_email() {
    reset_all();

    let app = crate::router();
    student_token(&app).await;

    let mut descriptor = signup_descriptor();
    descriptor.email = "A@B.COM".to_string();
    let response = app
        .oneshot(post_json("/api/account/signup", None, &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[serial]
#[tokio::test]
async fn signup_rejects_invalid_fields() {
    reset_all();

    let app = crate::router();

    let cases = [
        SignupDescriptor {
            name: "R2-D2".to_string(),
            ..signup_descriptor()
        },
        SignupDescriptor {
            email: "not an email".to_string(),
            ..signup_descriptor()
        },
        SignupDescriptor {
            password: "tiny".to_string(),
            ..signup_descriptor()
        },
        SignupDescriptor {
            division: "H".to_string(),
            ..signup_descriptor()
        },
        SignupDescriptor {
            roll: 101,
            ..signup_descriptor()
        },
        SignupDescriptor {
            prn: "123".to_string(),
            ..signup_descriptor()
        },
        SignupDescriptor {
            batch: 1999,
            ..signup_descriptor()
        },
    ];

    for descriptor in cases {
        let response = app
            .clone()
            .oneshot(post_json("/api/account/signup", None, &descriptor))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(crate::account::CREDENTIALS.get(), None);
    }
}

#[serial]
#[tokio::test]
async fn login_rejects_wrong_password() {
    reset_all();

    let app = crate::router();
    student_token(&app).await;

    let descriptor = LoginDescriptor {
        account: "a@b.com".to_string(),
        password: "secret2".to_string(),
    };
    let response = app
        .oneshot(post_json("/api/account/login", None, &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[serial]
#[tokio::test]
async fn mess_login_is_case_insensitive() {
    reset_all();

    let app = crate::router();
    crate::account::INSTANCE.ensure_seeded().await.unwrap();

    let descriptor = LoginDescriptor {
        account: "MESS_B".to_string(),
        password: "SIMS2025".to_string(),
    };
    let response = app
        .oneshot(post_json("/api/account/login", None, &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["role"], "mess");
}

#[serial]
#[tokio::test]
async fn change_password_keeps_other_fields() {
    reset_all();

    let app = crate::router();
    let token = student_token(&app).await;
    let before = crate::account::CREDENTIALS.get().unwrap();

    let descriptor = ChangePasswordDescriptor {
        current_password: "secret1".to_string(),
        new_password: "secret2".to_string(),
    };
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/account/change-password",
            Some(&token),
            &descriptor,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after = crate::account::CREDENTIALS.get().unwrap();
    assert_eq!(after.password, sha256::digest("secret2"));
    assert_eq!(
        after,
        messbuddy_shared::account::Credentials {
            password: after.password.clone(),
            ..before
        }
    );

    // the old password no longer logs in, the new one does
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/account/login",
            None,
            &LoginDescriptor {
                account: "a@b.com".to_string(),
                password: "secret1".to_string(),
            },
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(post_json(
            "/api/account/login",
            None,
            &LoginDescriptor {
                account: "a@b.com".to_string(),
                password: "secret2".to_string(),
            },
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[serial]
#[tokio::test]
async fn change_password_requires_the_current_one() {
    reset_all();

    let app = crate::router();
    let token = student_token(&app).await;

    let descriptor = ChangePasswordDescriptor {
        current_password: "wrong".to_string(),
        new_password: "secret2".to_string(),
    };
    let response = app
        .oneshot(post_json(
            "/api/account/change-password",
            Some(&token),
            &descriptor,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[serial]
#[tokio::test]
async fn reset_password_requires_matching_email() {
    reset_all();

    let app = crate::router();
    student_token(&app).await;

    let descriptor = ResetPasswordDescriptor {
        email: "someone@else.com".to_string(),
        new_password: "secret3".to_string(),
    };
    let response = app
        .clone()
        .oneshot(post_json("/api/account/reset-password", None, &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let descriptor = ResetPasswordDescriptor {
        email: "A@b.com".to_string(),
        new_password: "secret3".to_string(),
    };
    let response = app
        .oneshot(post_json("/api/account/reset-password", None, &descriptor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let creds = crate::account::CREDENTIALS.get().unwrap();
    assert_eq!(creds.password, sha256::digest("secret3"));
}

#[serial]
#[tokio::test]
async fn view_profile_hides_the_password() {
    reset_all();

    let app = crate::router();
    let token = student_token(&app).await;

    let response = app
        .oneshot(post_json(
            "/api/account/view",
            Some(&token),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["email"], "a@b.com");
    assert_eq!(json["name"], "Asha Patil");
    assert_eq!(json["roll"], 12);
    assert!(json.get("password").is_none());
}

#[serial]
#[tokio::test]
async fn sign_out_clears_the_record_and_sessions() {
    reset_all();

    let app = crate::router();
    let token = student_token(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/account/signout",
            Some(&token),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(crate::account::CREDENTIALS.get(), None);

    // the token died with the record
    let response = app
        .oneshot(post_json(
            "/api/account/view",
            Some(&token),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[serial]
#[tokio::test]
async fn mess_account_cannot_use_student_surface() {
    reset_all();

    let app = crate::router();
    let token = mess_token(&app).await;

    let response = app
        .oneshot(post_json(
            "/api/account/view",
            Some(&token),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
