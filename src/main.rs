use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{rt, web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use prize_savings::{
    api,
    config::Config,
    services::{
        blockchain_service::BlockchainClient,
        wallet_service::{WALLET_ADDRESS_HEADER, WALLET_CHAIN_ID_HEADER, WALLET_NAME_HEADER},
    },
    state::AppState,
};

fn startup_error(e: impl ToString) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(startup_error)?;
    let networks = config.networks().map_err(startup_error)?;
    let client = Arc::new(
        BlockchainClient::new(&networks, config.private_key.as_deref()).map_err(startup_error)?,
    );
    client.verify_chain_ids().await;

    let host = config.host.clone();
    let port = config.port;
    let poll_interval = Duration::from_millis(config.receipt_poll_interval_ms);
    let state = web::Data::new(
        AppState::new(config, client.clone(), client.clone()).map_err(startup_error)?,
    );

    let poller_state = state.clone();
    rt::spawn(async move {
        let mut interval = rt::time::interval(poll_interval);
        loop {
            interval.tick().await;
            let settled = poller_state.tracker.poll(client.as_ref()).await;
            if settled > 0 {
                info!("{} transactions settled", settled);
            }
            poller_state.expire_sessions();
        }
    });

    info!("listening on {}:{}", host, port);
    HttpServer::new(move || {
        let cors = state
            .config
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                header::HeaderName::from_static(WALLET_ADDRESS_HEADER),
                header::HeaderName::from_static(WALLET_CHAIN_ID_HEADER),
                header::HeaderName::from_static(WALLET_NAME_HEADER),
            ])
            .supports_credentials();
        App::new()
            .app_data(state.clone())
            .configure(api::config)
            .wrap(cors)
    })
    .bind((host.as_str(), port))
    .map_err(|e| {
        error!("failed to bind {}:{}: {}", host, port, e);
        e
    })?
    .run()
    .await
}
