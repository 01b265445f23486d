mod common;

use axum::http::StatusCode;
use common::{PASSWORD, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_registration_succeeds_and_lowercases_email() {
    let app = TestApp::spawn().await;

    let (status, body) = app.register("Ada.Obi@Example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "message": "Registration successful" }));

    let user = app
        .store()
        .get_user_by_email("ada.obi@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.email, "ada.obi@example.com");
    assert!(user.is_active);
    assert!(user.is_verified);
    assert!(!user.is_staff);
}

#[tokio::test]
async fn test_registration_rejects_duplicate_email_case_insensitively() {
    let app = TestApp::spawn().await;

    let (status, _) = app.register("ada@example.com").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.register("ADA@Example.COM").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "email": ["A user with this email already exists."] })
    );
}

#[tokio::test]
async fn test_registration_field_errors() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/account/registration/",
            None,
            json!({ "email": "not-an-email", "password": "123", "password2": "123" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["email"], json!(["Enter a valid email address."]));
    assert_eq!(body["first_name"], json!(["This field is required."]));
    assert_eq!(body["last_name"], json!(["This field is required."]));

    let password_errors = body["password"].as_array().unwrap();
    assert!(password_errors.contains(&json!(
        "This password is too short. It must contain at least 8 characters."
    )));
    assert!(password_errors.contains(&json!("This password is entirely numeric.")));
}

#[tokio::test]
async fn test_registration_password_mismatch() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/account/registration/",
            None,
            json!({
                "email": "ada@example.com",
                "first_name": "Ada",
                "last_name": "Obi",
                "password": PASSWORD,
                "password2": "Different1@",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "password": ["Passwords do not match."] }));
    assert!(!app.store().email_exists("ada@example.com").await.unwrap());
}

#[tokio::test]
async fn test_login_returns_token_pair() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com").await;

    let (status, body) = app
        .post(
            "/account/login/",
            None,
            json!({ "email": "ADA@example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com").await;

    let (status, body) = app
        .post(
            "/account/login/",
            None,
            json!({ "email": "ada@example.com", "password": "Wrong-pass1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "non_field_errors": ["Invalid credentials."] }));

    let (status, body) = app
        .post(
            "/account/login/",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "non_field_errors": ["Invalid credentials."] }));

    let (status, body) = app.post("/account/login/", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["email"], json!(["This field is required."]));
    assert_eq!(body["password"], json!(["This field is required."]));
}

#[tokio::test]
async fn test_login_reports_disabled_and_unverified_accounts() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com").await;
    let user = app
        .store()
        .get_user_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();

    app.store().set_user_flags(user.id, false, true).await.unwrap();
    let (status, body) = app
        .post(
            "/account/login/",
            None,
            json!({ "email": "ada@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "non_field_errors": ["User account is disabled."] }));

    app.store().set_user_flags(user.id, true, false).await.unwrap();
    let (_, body) = app
        .post(
            "/account/login/",
            None,
            json!({ "email": "ada@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(body, json!({ "non_field_errors": ["Email is not verified."] }));
}

#[tokio::test]
async fn test_refresh_rotates_and_blacklists_old_token() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com").await;
    let (_, refresh) = app.login("ada@example.com").await;

    let (status, body) = app
        .post("/account/token/refresh/", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["refresh"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);
    assert!(body["access"].is_string());

    let (status, body) = app
        .post("/account/token/refresh/", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({ "detail": "Token is blacklisted", "code": "token_not_valid" })
    );

    let (status, _) = app
        .post("/account/token/refresh/", None, json!({ "refresh": rotated }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_garbage_and_access_tokens() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com").await;
    let (access, _) = app.login("ada@example.com").await;

    for token in ["garbage", access.as_str()] {
        let (status, body) = app
            .post("/account/token/refresh/", None, json!({ "refresh": token }))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })
        );
    }

    let (status, body) = app.post("/account/token/refresh/", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "refresh": ["This field is required."] }));
}

#[tokio::test]
async fn test_logout_blacklists_refresh_token() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com").await;
    let (access, refresh) = app.login("ada@example.com").await;

    let (status, body) = app
        .post("/account/logout/", Some(&access), json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Successfully logged out" }));

    let (status, body) = app
        .post("/account/logout/", Some(&access), json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "refresh": ["Invalid or expired refresh token"] }));

    let (status, _) = app
        .post("/account/token/refresh/", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_validation_and_authentication() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com").await;
    let (access, refresh) = app.login("ada@example.com").await;

    let (status, body) = app
        .post("/account/logout/", Some(&access), json!({ "refresh": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "refresh": ["Refresh token cannot be empty"] }));

    let (status, body) = app
        .post("/account/logout/", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({ "detail": "Authentication credentials were not provided." })
    );

    let (status, body) = app
        .post("/account/logout/", Some(&refresh), json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })
    );
}

#[tokio::test]
async fn test_inactive_user_cannot_use_access_token() {
    let app = TestApp::spawn().await;
    let (user, access) = app.signed_up("ada@example.com").await;

    app.store().set_user_flags(user.id, false, true).await.unwrap();

    let (status, body) = app
        .get(&format!("/loan/retrieve-all-loans/{}/", user.id), Some(&access))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "detail": "User is inactive" }));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, body) = app.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"], true);
}

#[tokio::test]
async fn test_concurrent_duplicate_registration_is_a_field_error() {
    let app = TestApp::spawn().await;

    let (first, second) = tokio::join!(
        app.register("ada@example.com"),
        app.register("ADA@example.com"),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let rejected = if first.0 == StatusCode::BAD_REQUEST { first.1 } else { second.1 };
    assert_eq!(
        rejected,
        json!({ "email": ["A user with this email already exists."] })
    );
}
