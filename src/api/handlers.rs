use actix_web::{cookie::Cookie, get, post, put, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    errors::CustomError,
    models::{
        api_response::success_response,
        prize_pool::PrizePool,
        transaction::{Transaction, TxId},
    },
    state::AppState,
};

use super::{context, guarded, LANGUAGE_COOKIE};

#[derive(Serialize)]
pub struct PoolSummary {
    id: String,
    #[serde(flatten)]
    pool: PrizePool,
}

#[derive(Deserialize)]
pub struct HeaderQuery {
    testnets: Option<bool>,
    #[serde(default)]
    warning_dismissed: bool,
}

#[derive(Deserialize)]
pub struct LanguageRequest {
    language: String,
}

#[derive(Deserialize)]
pub struct ClearStorageRequest {
    #[serde(default)]
    confirmed: bool,
}

#[get("/pools")]
pub async fn list_pools(state: web::Data<AppState>) -> HttpResponse {
    let pools: Vec<PoolSummary> = state
        .config
        .prize_pools
        .iter()
        .map(|pool| PoolSummary {
            id: pool.id(),
            pool: pool.clone(),
        })
        .collect();
    success_response(pools)
}

#[get("/pools/{pool_id}/balances/{address}")]
pub async fn get_balances(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, CustomError> {
    let ctx = context(&state, &req);
    let (pool_id, address) = path.into_inner();

    let result = match state.find_pool(&pool_id) {
        Ok(pool) => state.balances.get_users_prize_pool_balances(&address, pool).await,
        Err(e) => Err(e),
    };
    guarded(&state, &ctx, result).map(success_response)
}

#[get("/transactions/{tx_id}")]
pub async fn get_transaction(
    state: web::Data<AppState>,
    tx_id: web::Path<TxId>,
) -> Result<HttpResponse, CustomError> {
    let tx_id = tx_id.into_inner();
    let tx: Transaction = state
        .tracker
        .get(tx_id)
        .ok_or(CustomError::TransactionNotFoundError(tx_id))?;
    Ok(success_response(tx))
}

#[get("/header")]
pub async fn get_header(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<HeaderQuery>,
) -> HttpResponse {
    let ctx = context(&state, &req);
    let use_testnets = query.testnets.unwrap_or(state.config.use_testnets);
    success_response(state.chrome.header_state(
        &ctx.wallet,
        use_testnets,
        query.warning_dismissed,
        &ctx.locale,
    ))
}

/// Remembers the language for this browser only.
#[put("/settings/language")]
pub async fn set_language(
    state: web::Data<AppState>,
    body: web::Json<LanguageRequest>,
) -> Result<HttpResponse, CustomError> {
    if !state.i18n.is_supported(&body.language) {
        return Err(CustomError::ValidationError(format!(
            "unsupported language: {}",
            body.language
        )));
    }

    let cookie = Cookie::build(LANGUAGE_COOKIE, body.language.clone())
        .path("/")
        .finish();
    let mut response = success_response(&body.language);
    response
        .add_cookie(&cookie)
        .map_err(|_| CustomError::InternalServerError)?;
    Ok(response)
}

#[post("/settings/clear-storage")]
pub async fn clear_storage(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ClearStorageRequest>,
) -> HttpResponse {
    let ctx = context(&state, &req);
    let stores = state.local_stores();
    success_response(state.chrome.clear_storage(body.confirmed, &stores, &ctx.locale))
}
