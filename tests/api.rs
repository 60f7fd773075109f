mod common;

use actix_web::{
    http::{header, StatusCode},
    test, web, App,
};
use serde_json::{json, Value};

use prize_savings::api;

use common::{app_state, app_state_with, pool, units, FakeChain, USER};

const WALLET: [(&str, &str); 3] = [
    ("x-wallet-address", USER),
    ("x-wallet-chain-id", "137"),
    ("x-wallet-name", "MetaMask"),
];

fn with_wallet(mut req: test::TestRequest) -> test::TestRequest {
    for header in WALLET {
        req = req.insert_header(header);
    }
    req
}

#[actix_web::test]
async fn lists_configured_pools() {
    let chain = FakeChain::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&chain)))
            .configure(api::config),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/pools").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["result"].as_array().unwrap().len(), 2);
    assert_eq!(body["result"][0]["id"], pool().id());
}

#[actix_web::test]
async fn withdrawal_needs_a_connected_wallet() {
    let chain = FakeChain::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&chain)))
            .configure(api::config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/withdrawals")
        .set_json(json!({ "pool_id": pool().id() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn amount_errors_are_localized() {
    let chain = FakeChain::new();
    *chain.ticket_balance.lock().unwrap() = units(5);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&chain)))
            .configure(api::config),
    )
    .await;

    let req = with_wallet(test::TestRequest::post().uri("/api/v1/withdrawals"))
        .set_json(json!({ "pool_id": pool().id() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["result"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["result"]["step"], "input");

    let req = with_wallet(test::TestRequest::post().uri(&format!("/api/v1/withdrawals/{}/amount", id)))
        .set_json(json!({ "amount": "6" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Insufficient funds");

    // Accept-Language only applies to the request carrying it
    let req = with_wallet(test::TestRequest::post().uri(&format!("/api/v1/withdrawals/{}/amount", id)))
        .insert_header((header::ACCEPT_LANGUAGE, "es-ES, en;q=0.5"))
        .set_json(json!({ "amount": "6" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"]["message"], "Fondos insuficientes");

    let req = with_wallet(test::TestRequest::post().uri(&format!("/api/v1/withdrawals/{}/amount", id)))
        .set_json(json!({ "amount": "6" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"]["message"], "Insufficient funds");
    assert_eq!(body["code"], 422);
}

#[actix_web::test]
async fn language_setting_is_kept_per_browser() {
    let chain = FakeChain::new();
    *chain.ticket_balance.lock().unwrap() = units(5);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&chain)))
            .configure(api::config),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/v1/settings/language")
        .set_json(json!({ "language": "es" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let cookie = resp
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "language")
        .unwrap()
        .into_owned();
    assert_eq!(cookie.value(), "es");

    let req = with_wallet(test::TestRequest::post().uri("/api/v1/withdrawals"))
        .set_json(json!({ "pool_id": pool().id() }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["result"]["id"].as_str().unwrap().to_string();

    let req = with_wallet(test::TestRequest::post().uri(&format!("/api/v1/withdrawals/{}/amount", id)))
        .cookie(cookie)
        .set_json(json!({ "amount": "6" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"]["message"], "Fondos insuficientes");

    let req = with_wallet(test::TestRequest::post().uri(&format!("/api/v1/withdrawals/{}/amount", id)))
        .set_json(json!({ "amount": "6" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"]["message"], "Insufficient funds");
}

#[actix_web::test]
async fn unknown_language_is_refused() {
    let chain = FakeChain::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&chain)))
            .configure(api::config),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/v1/settings/language")
        .set_json(json!({ "language": "klingon" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn header_reports_degraded_chains() {
    let chain = FakeChain::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state_with(&chain, &[("CHAIN_IDS_TO_BLOCK", "137")])))
            .configure(api::config),
    )
    .await;

    let req = with_wallet(test::TestRequest::get().uri("/api/v1/header")).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let header = &body["result"];
    assert_eq!(header["is_wallet_connected"], true);
    assert_eq!(header["is_on_supported_network"], true);
    assert_eq!(header["network_warning"]["is_open"], true);
    assert_eq!(header["network_warning"]["chains"][0]["chain_id"], 137);

    let req = test::TestRequest::get()
        .uri("/api/v1/header?warning_dismissed=true")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"]["is_wallet_connected"], false);
    assert_eq!(body["result"]["network_warning"]["is_open"], false);
}

#[actix_web::test]
async fn clearing_storage_needs_confirmation() {
    let chain = FakeChain::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&chain)))
            .configure(api::config),
    )
    .await;

    let req = with_wallet(test::TestRequest::post().uri("/api/v1/delegations"))
        .set_json(json!({ "pool_id": pool().id() }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["result"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/settings/clear-storage")
        .set_json(json!({ "confirmed": false }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"]["cleared"], false);
    assert!(body["result"]["warning"].as_str().unwrap().contains("DOES NOT"));

    let req = test::TestRequest::post()
        .uri("/api/v1/settings/clear-storage")
        .set_json(json!({ "confirmed": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"]["cleared"], true);
    assert_eq!(body["result"]["reload"], true);

    let req = with_wallet(test::TestRequest::get().uri(&format!("/api/v1/delegations/{}", id)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unknown_pool_is_not_found() {
    let chain = FakeChain::new();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&chain)))
            .configure(api::config),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/pools/nope/balances/{}", USER))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
