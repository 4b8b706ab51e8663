use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use quill_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

use super::configure_routes;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

const PASSWORD: &str = "asdf1234!!";

fn test_state() -> web::Data<AppState> {
    let tokens = JwtTokenService::new(JwtConfig {
        secret: "test-secret-key".to_string(),
        ..JwtConfig::default()
    });

    web::Data::new(AppState::from_repositories(
        &InMemoryStore::new().repositories(),
        Arc::new(tokens),
        Arc::new(Argon2PasswordService::fast()),
    ))
}

/// Run one request against a fresh app over `state`; returns status and JSON body.
async fn send(state: &web::Data<AppState>, req: test::TestRequest) -> (StatusCode, Value) {
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(configure_routes),
    )
    .await;

    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Sign up `username` and return (user id, access token, refresh token).
async fn register(state: &web::Data<AppState>, username: &str) -> (String, String, String) {
    let (status, body) = send(
        state,
        test::TestRequest::post().uri("/users/sign/").set_json(json!({
            "username": username,
            "email": format!("{username}@naver.com"),
            "password": PASSWORD,
            "password2": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        state,
        test::TestRequest::post()
            .uri("/users/token/")
            .set_json(json!({ "username": username, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    (
        id,
        body["access"].as_str().unwrap().to_string(),
        body["refresh"].as_str().unwrap().to_string(),
    )
}

async fn write_article(state: &web::Data<AppState>, token: &str, title: &str) -> String {
    let (status, _) = send(
        state,
        test::TestRequest::post()
            .uri("/articles/")
            .insert_header(bearer(token))
            .set_json(json!({ "title": title, "content": "본문" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(state, test::TestRequest::get().uri("/articles/")).await;
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["title"] == title)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[actix_rt::test]
async fn test_health_check() {
    let state = test_state();
    let (status, body) = send(&state, test::TestRequest::get().uri("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "memory");
}

#[actix_rt::test]
async fn test_sign_up_validation_errors() {
    let state = test_state();
    register(&state, "zxcvbnasdf_").await;

    let (status, body) = send(
        &state,
        test::TestRequest::post().uri("/users/sign/").set_json(json!({
            "username": "zxcvbnasdf_",
            "email": "other@naver.com",
            "password": "abc",
            "password2": "abc",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["username"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[actix_rt::test]
async fn test_token_with_wrong_password() {
    let state = test_state();
    register(&state, "zxcvbnasdf_").await;

    let (status, _) = send(
        &state,
        test::TestRequest::post()
            .uri("/users/token/")
            .set_json(json!({ "username": "zxcvbnasdf_", "password": "wrong1234!!" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_refresh_and_verify() {
    let state = test_state();
    let (_, access, refresh) = register(&state, "zxcvbnasdf_").await;

    let (status, body) = send(
        &state,
        test::TestRequest::post()
            .uri("/users/refresh/")
            .set_json(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());

    // An access token is not a refresh token.
    let (status, _) = send(
        &state,
        test::TestRequest::post()
            .uri("/users/refresh/")
            .set_json(json!({ "refresh": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &state,
        test::TestRequest::post()
            .uri("/users/verify/")
            .set_json(json!({ "token": access })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = send(
        &state,
        test::TestRequest::post()
            .uri("/users/verify/")
            .set_json(json!({ "token": "not-a-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_article_write_needs_authentication() {
    let state = test_state();

    let (status, _) = send(
        &state,
        test::TestRequest::post()
            .uri("/articles/")
            .set_json(json!({ "title": "제목", "content": "본문" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_invalid_bearer_rejected_on_optional_route() {
    let state = test_state();

    let (status, _) = send(
        &state,
        test::TestRequest::get()
            .uri("/articles/")
            .insert_header(bearer("garbage")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_article_listing_and_ownership() {
    let state = test_state();
    let (_, author, _) = register(&state, "zxcvbnasdf_").await;
    let (_, other, _) = register(&state, "otheruser_").await;
    let id = write_article(&state, &author, "제목").await;

    let (status, body) = send(&state, test::TestRequest::get().uri("/articles/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["author"], "zxcvbnasdf_");
    assert!(body["results"][0]["created_at"].as_str().unwrap().contains('월'));

    let (status, body) = send(
        &state,
        test::TestRequest::put()
            .uri(&format!("/articles/{id}/"))
            .insert_header(bearer(&other))
            .set_json(json!({ "title": "남의 글" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "권한이 없습니다");

    let (status, body) = send(
        &state,
        test::TestRequest::put()
            .uri(&format!("/articles/{id}/"))
            .insert_header(bearer(&author))
            .set_json(json!({ "title": "바뀐 제목" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "바뀐 제목");

    let (status, _) = send(
        &state,
        test::TestRequest::delete()
            .uri(&format!("/articles/{id}/"))
            .insert_header(bearer(&author)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &state,
        test::TestRequest::get().uri(&format!("/articles/{id}/")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_title_too_long_is_bad_request() {
    let state = test_state();
    let (_, token, _) = register(&state, "zxcvbnasdf_").await;

    let (status, body) = send(
        &state,
        test::TestRequest::post()
            .uri("/articles/")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "가".repeat(31), "content": "본문" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["title"].is_array());
}

#[actix_rt::test]
async fn test_like_toggle_messages() {
    let state = test_state();
    let (_, token, _) = register(&state, "zxcvbnasdf_").await;
    let id = write_article(&state, &token, "제목").await;
    let like = || {
        test::TestRequest::post()
            .uri(&format!("/articles/{id}/like/"))
            .insert_header(bearer(&token))
    };

    let (_, body) = send(&state, like()).await;
    assert_eq!(body["message"], "like했습니다");

    let (_, body) = send(
        &state,
        test::TestRequest::get().uri(&format!("/articles/{id}/like/")),
    )
    .await;
    assert_eq!(body[0]["username"], "zxcvbnasdf_");

    let (_, body) = send(&state, like()).await;
    assert_eq!(body["message"], "unlike했습니다");
}

#[actix_rt::test]
async fn test_follow_and_feed() {
    let state = test_state();
    let (me_id, me, _) = register(&state, "zxcvbnasdf_").await;
    let (them_id, them, _) = register(&state, "otheruser_").await;

    let (status, body) = send(
        &state,
        test::TestRequest::get()
            .uri("/articles/feed/")
            .insert_header(bearer(&me)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "팔로우한 사용자가 없습니다");

    let (status, body) = send(
        &state,
        test::TestRequest::post()
            .uri(&format!("/users/{me_id}/follow/"))
            .insert_header(bearer(&me)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Can't self follow");

    let (_, body) = send(
        &state,
        test::TestRequest::post()
            .uri(&format!("/users/{them_id}/follow/"))
            .insert_header(bearer(&me)),
    )
    .await;
    assert_eq!(body, json!("Follow"));

    write_article(&state, &them, "팔로우한 글").await;
    let (_, body) = send(
        &state,
        test::TestRequest::get()
            .uri("/articles/feed/")
            .insert_header(bearer(&me)),
    )
    .await;
    assert_eq!(body["results"][0]["title"], "팔로우한 글");
}

#[actix_rt::test]
async fn test_sign_out_hides_profile_and_blocks_token() {
    let state = test_state();
    let (id, token, refresh) = register(&state, "zxcvbnasdf_").await;

    let (status, body) = send(
        &state,
        test::TestRequest::put()
            .uri("/users/sign/")
            .insert_header(bearer(&token))
            .set_json(json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "signout_success");

    let (status, body) = send(&state, test::TestRequest::get().uri(&format!("/users/{id}/"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "탈퇴한 사용자입니다");

    let (status, _) = send(
        &state,
        test::TestRequest::get()
            .uri("/users/sign/")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        test::TestRequest::post()
            .uri("/users/refresh/")
            .set_json(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_malformed_json_is_bad_request() {
    let state = test_state();

    let (status, body) = send(
        &state,
        test::TestRequest::post()
            .uri("/users/sign/")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[actix_rt::test]
async fn test_request_id_is_echoed() {
    let state = test_state();
    let app = test::init_service(
        App::new()
            .wrap(RequestIdMiddleware)
            .app_data(state.clone())
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("x-request-id", "abc-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");
}

#[actix_rt::test]
async fn test_huge_page_number_is_an_empty_page() {
    let state = test_state();
    let (_, token, _) = register(&state, "zxcvbnasdf_").await;
    write_article(&state, &token, "제목").await;

    let (status, body) = send(
        &state,
        test::TestRequest::get().uri("/articles/?page=18446744073709551615"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["next"], Value::Null);

    let (status, _) = send(
        &state,
        test::TestRequest::get()
            .uri("/articles/bookmark_list/?page=18446744073709551615&page_size=1")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_article_detail_shows_callers_own_state() {
    let state = test_state();
    let (_, author, _) = register(&state, "zxcvbnasdf_").await;
    let (_, reader, _) = register(&state, "qwertyasdf_").await;
    let id = write_article(&state, &author, "제목").await;

    let (status, _) = send(
        &state,
        test::TestRequest::post()
            .uri(&format!("/articles/{id}/like/"))
            .insert_header(bearer(&reader)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let detail = |token: Option<&str>| {
        let req = test::TestRequest::get().uri(&format!("/articles/{id}/"));
        match token {
            Some(token) => req.insert_header(bearer(token)),
            None => req,
        }
    };

    let (_, body) = send(&state, detail(Some(&reader))).await;
    assert_eq!(body["likes_count"], 1);
    assert_eq!(body["liked"], true);
    assert_eq!(body["bookmarked"], false);

    let (_, body) = send(&state, detail(Some(&author))).await;
    assert_eq!(body["liked"], false);

    let (_, body) = send(&state, detail(None)).await;
    assert_eq!(body["likes_count"], 1);
    assert!(body.get("liked").is_none());
    assert!(body.get("bookmarked").is_none());
}
