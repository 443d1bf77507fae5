use actix_web::{web, HttpResponse, ResponseError};
use crate::{database::MongoDB, services::auth_service};
use crate::services::auth_service::{LoginRequest, LoginResponse, MessageResponse, SignupRequest};

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = MessageResponse),
        (status = 400, description = "Missing fields, username too long, or user already exists"),
        (status = 500, description = "Server error")
    )
)]
pub async fn signup(
    db: web::Data<MongoDB>,
    request: web::Json<SignupRequest>,
) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /signup - email: {}", email);

    match auth_service::signup(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Signup successful: {}", email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Signup failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("🔐 POST /login - email: {}", email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

/// 🗑️ Deletes the account and its workout history
#[utoipa::path(
    delete,
    path = "/account",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn delete_account(
    db: web::Data<MongoDB>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("🗑️ DELETE /account - email: {}", email);

    match auth_service::delete_account(&db, &request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to delete account {}: {}", email, e);
            e.error_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::header::ContentType, http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::api::{configure, test_support::{live_db, offline_db}};

    #[actix_web::test]
    async fn test_malformed_body_gets_json_message() {
        let app = test::init_service(App::new().app_data(offline_db().await).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/signup")
            .insert_header(ContentType::json())
            .set_payload("not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid request body"), "{}", message);
    }

    #[actix_web::test]
    async fn test_signup_validation_messages() {
        let app = test::init_service(App::new().app_data(offline_db().await).configure(configure)).await;

        let cases = [
            (json!({ "email": "ana@example.com", "password": "pw" }), "All fields are required"),
            (
                json!({ "email": "ana@example.com", "password": "pw", "username": "much-too-long" }),
                "Username must be at most 10 characters",
            ),
        ];

        for (payload, expected) in cases {
            let req = test::TestRequest::post().uri("/signup").set_json(payload).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({ "message": expected }));
        }
    }

    #[actix_web::test]
    async fn test_login_and_delete_require_credentials() {
        let app = test::init_service(App::new().app_data(offline_db().await).configure(configure)).await;

        let login = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "email": "ana@example.com" }))
            .to_request();
        let resp = test::call_service(&app, login).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "All fields are required");

        let delete = test::TestRequest::delete()
            .uri("/account")
            .set_json(json!({ "password": "pw" }))
            .to_request();
        let resp = test::call_service(&app, delete).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_unknown_user_is_unauthorized() {
        let app = test::init_service(App::new().app_data(live_db().await).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "email": format!("{}@example.com", uuid::Uuid::new_v4()), "password": "pw" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "message": "Invalid credentials" }));
    }
}
