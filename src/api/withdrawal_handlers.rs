use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    errors::CustomError,
    models::api_response::{created_response, success_response},
    state::AppState,
};

use super::{context, guarded};

#[derive(Deserialize)]
pub struct StartWithdrawalRequest {
    pool_id: String,
}

#[derive(Deserialize)]
pub struct AmountRequest {
    amount: String,
}

#[derive(Deserialize)]
pub struct ExitFeeApprovalRequest {
    approved: bool,
}

#[post("/withdrawals")]
pub async fn start_withdrawal(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<StartWithdrawalRequest>,
) -> Result<HttpResponse, CustomError> {
    let ctx = context(&state, &req);
    let result = match state.find_pool(&body.pool_id) {
        Ok(pool) => state.withdrawals.start(pool, &ctx.wallet).await,
        Err(e) => Err(e),
    };
    guarded(&state, &ctx, result).map(created_response)
}

#[get("/withdrawals/{id}")]
pub async fn get_withdrawal(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let result = state.withdrawals.view(id.into_inner());
    guarded(&state, &context(&state, &req), result).map(success_response)
}

/// Amount the user would receive for what is typed so far; `null` while the
/// input does not parse.
#[post("/withdrawals/{id}/preview")]
pub async fn preview_withdrawal(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    body: web::Json<AmountRequest>,
) -> Result<HttpResponse, CustomError> {
    let result = state.withdrawals.preview(id.into_inner(), &body.amount);
    guarded(&state, &context(&state, &req), result).map(success_response)
}

#[post("/withdrawals/{id}/amount")]
pub async fn submit_amount(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    body: web::Json<AmountRequest>,
) -> Result<HttpResponse, CustomError> {
    let result = state
        .withdrawals
        .submit_amount(id.into_inner(), &body.amount)
        .await;
    guarded(&state, &context(&state, &req), result).map(success_response)
}

#[post("/withdrawals/{id}/back")]
pub async fn go_back(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let result = state.withdrawals.back(id.into_inner());
    guarded(&state, &context(&state, &req), result).map(success_response)
}

#[put("/withdrawals/{id}/exit-fee-approval")]
pub async fn set_exit_fee_approval(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    body: web::Json<ExitFeeApprovalRequest>,
) -> Result<HttpResponse, CustomError> {
    let result = state
        .withdrawals
        .set_exit_fee_approved(id.into_inner(), body.approved);
    guarded(&state, &context(&state, &req), result).map(success_response)
}

#[post("/withdrawals/{id}/confirm")]
pub async fn confirm_withdrawal(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let ctx = context(&state, &req);
    let result = state.withdrawals.confirm(id.into_inner(), &ctx.wallet).await;
    guarded(&state, &ctx, result).map(success_response)
}

#[delete("/withdrawals/{id}")]
pub async fn dismiss_withdrawal(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let id = id.into_inner();
    let result = state.withdrawals.dismiss(id);
    guarded(&state, &context(&state, &req), result).map(|_| success_response(id))
}
