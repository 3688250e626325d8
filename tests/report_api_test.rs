use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use face_to_face_backend::{
    config::{Config, LogFormat, SessionSettings},
    database::catalog::Catalog,
    middleware::auth::Claims,
    routes, AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

const JWT_SECRET: &str = "test_secret_key";

fn setup_app() -> Router {
    let config = Config {
        server_address: "127.0.0.1:0".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        qr_signing_secret: "qr_test_secret".to_string(),
        pad_rps: 1000,
        public_rps: 1000,
        log_format: LogFormat::Text,
        session: SessionSettings {
            scan_success_probability: 1.0,
            scan_verify_delay: Duration::from_millis(100),
            authorize_settle_delay: Duration::from_millis(100),
            challenge_validity_secs: 60,
        },
    };

    // Only the first two questions are mandatory here, so a two-answer
    // submission is complete.
    let mut catalog = Catalog::seeded();
    for question in catalog.default_questions.iter_mut() {
        question.required = question.id <= 2;
    }

    let state = AppState::new(&config, catalog);
    routes::app_router(state, &config)
}

fn auth() -> String {
    let claims = Claims {
        sub: "agent-1".to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some("agent".to_string()),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", auth());
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null))
}

/// Runs the QR handshake until the pad lands on activity selection.
async fn authorize_customer(app: &Router, recommendation_id: &str) {
    call(
        app,
        "POST",
        "/api/pad/challenge",
        Some(json!({"recommendation_id": recommendation_id})),
    )
    .await;
    let req = Request::builder()
        .method("POST")
        .uri("/api/phone/scan")
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(req).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/phone/authorize")
        .header("content-type", "application/json")
        .body(Body::from(json!({"confirmed": true}).to_string()))
        .unwrap();
    app.clone().oneshot(req).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let (_, body) = call(app, "GET", "/api/pad/session", None).await;
    assert_eq!(body["agent_screen"], "activity_selection");
}

#[tokio::test(start_paused = true)]
async fn unavailable_activity_is_removed_and_screen_kept() {
    let app = setup_app();
    authorize_customer(&app, "2").await;

    let (_, body) = call(&app, "GET", "/api/pad/activities", None).await;
    let ids: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["act1", "act2", "act3", "act4"]);

    let (status, body) = call(&app, "POST", "/api/pad/activities/act4/fill", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "activity_unavailable");

    let (_, body) = call(&app, "GET", "/api/pad/activities", None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 3);

    let (_, body) = call(&app, "GET", "/api/pad/session", None).await;
    assert_eq!(body["agent_screen"], "activity_selection");
    assert!(body["notice"].as_str().unwrap().contains("已过期下架活动示例"));
    assert!(body["selected_activity"].is_null());

    let (status, _) = call(&app, "POST", "/api/pad/activities/act4/preview", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn questionnaire_submission_lands_first_in_report() {
    let app = setup_app();
    authorize_customer(&app, "2").await;

    let (status, body) = call(&app, "POST", "/api/pad/activities/act3/preview", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["agent_screen"], "preview");

    let (_, body) = call(&app, "GET", "/api/pad/preview", None).await;
    assert_eq!(body["activity"]["id"], "act3");
    assert_eq!(body["outline"].as_array().unwrap().len(), 4);
    assert_eq!(body["outline"][0]["index"], 1);

    let (_, body) = call(&app, "POST", "/api/pad/preview/start", None).await;
    assert_eq!(body["session"]["agent_screen"], "fill");

    let (_, body) = call(&app, "GET", "/api/pad/questionnaire", None).await;
    assert_eq!(body["index"], 0);
    assert_eq!(body["total"], 4);
    assert_eq!(body["can_advance"], false);

    let (status, body) = call(&app, "POST", "/api/pad/questionnaire/next", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let select = |question_id: u32, option: &str| json!({"question_id": question_id, "option": option});

    call(&app, "POST", "/api/pad/questionnaire/select", Some(select(1, "商业保险"))).await;
    let (status, body) = call(&app, "POST", "/api/pad/questionnaire/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 1);

    let (status, body) = call(
        &app,
        "POST",
        "/api/pad/challenge",
        Some(json!({"recommendation_id": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state");
    let (_, body) = call(&app, "GET", "/api/pad/session", None).await;
    assert_eq!(body["agent_screen"], "fill");
    assert_eq!(body["customer"]["name"], "李*");
    assert_eq!(body["challenge_displayed"], false);

    call(&app, "POST", "/api/pad/questionnaire/select", Some(select(2, "理赔速度"))).await;
    call(&app, "POST", "/api/pad/questionnaire/select", Some(select(2, "公司品牌"))).await;
    call(&app, "POST", "/api/pad/questionnaire/select", Some(select(2, "保障范围"))).await;
    let (_, body) = call(&app, "POST", "/api/pad/questionnaire/select", Some(select(2, "保障范围"))).await;
    assert_eq!(body["answers"]["2"], json!(["公司品牌", "理赔速度"]));

    let (status, body) = call(&app, "POST", "/api/pad/questionnaire/select", Some(select(2, "不存在"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    call(&app, "POST", "/api/pad/questionnaire/next", None).await;
    call(&app, "POST", "/api/pad/questionnaire/next", None).await;
    let (_, body) = call(&app, "POST", "/api/pad/questionnaire/next", None).await;
    assert_eq!(body["phase"], "ready_to_submit");
    assert_eq!(body["is_last"], true);

    let (status, body) = call(&app, "POST", "/api/pad/questionnaire/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["agent_screen"], "data_report");
    assert!(body["session"]["customer"].is_null());
    let record = &body["record"];
    let record_id = record["id"].as_str().unwrap().to_string();
    assert_ne!(record_id, "res1");
    assert_eq!(record["customer_name"], "李*");
    assert_eq!(record["enterprise"], "腾讯科技");
    assert_eq!(record["activity_name"], "少儿教育储备金需求摸底");
    let answered: Vec<u64> = record["answers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["question_id"].as_u64().unwrap())
        .collect();
    assert_eq!(answered, vec![1, 2]);
    assert_eq!(record["answers"][1]["display"], "公司品牌、理赔速度");

    let (_, body) = call(&app, "GET", "/api/pad/results", None).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["id"], record_id.as_str());

    let (_, body) = call(&app, "GET", "/api/pad/results?sort=asc", None).await;
    assert_eq!(body["items"][0]["id"], "res1");

    let (_, body) = call(&app, "GET", "/api/pad/results?search=%E9%A1%BA%E4%B8%B0", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["customer_name"], "周*");

    let (status, body) = call(&app, "GET", &format!("/api/pad/results/{}", record_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answers"][0]["title"], "您目前主要的理财偏好是什么？");
    assert_eq!(body["answers"][1]["answer"], json!(["公司品牌", "理赔速度"]));

    let (status, _) = call(&app, "GET", "/api/pad/results/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, "POST", "/api/pad/back", None).await;
    assert_eq!(body["applied"], true);
    assert_eq!(body["session"]["agent_screen"], "home");
}

#[tokio::test]
async fn report_export_returns_xlsx_attachment() {
    let app = setup_app();

    let (_, body) = call(&app, "POST", "/api/pad/report", None).await;
    assert_eq!(body["session"]["agent_screen"], "data_report");

    let req = Request::builder()
        .method("GET")
        .uri("/api/pad/results/export?sort=desc")
        .header("authorization", auth())
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment;"));
    let bytes = to_bytes(resp.into_body(), 10 * 1024 * 1024).await.unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let (status, body) = call(&app, "POST", "/api/pad/report", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state");
}
