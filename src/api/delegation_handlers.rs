use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    errors::CustomError,
    models::api_response::{created_response, success_response},
    state::AppState,
};

use super::{context, guarded, RequestContext};

#[derive(Deserialize)]
pub struct OpenPanelRequest {
    pool_id: String,
}

#[derive(Deserialize)]
pub struct InputRequest {
    address: String,
}

/// Every panel action answers with the re-rendered panel.
async fn render(
    state: &AppState,
    ctx: &RequestContext<'_>,
    id: Uuid,
    action: Result<(), CustomError>,
) -> Result<HttpResponse, CustomError> {
    let result = match action {
        Ok(()) => state.delegations.view(id, &ctx.wallet, &ctx.locale).await,
        Err(e) => Err(e),
    };
    guarded(state, ctx, result).map(success_response)
}

#[post("/delegations")]
pub async fn open_panel(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<OpenPanelRequest>,
) -> Result<HttpResponse, CustomError> {
    let ctx = context(&state, &req);
    let result = match state.find_pool(&body.pool_id) {
        Ok(pool) => state.delegations.open(pool, &ctx.wallet, &ctx.locale).await,
        Err(e) => Err(e),
    };
    guarded(&state, &ctx, result).map(created_response)
}

#[get("/delegations/{id}")]
pub async fn get_panel(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    render(&state, &context(&state, &req), id.into_inner(), Ok(())).await
}

#[post("/delegations/{id}/edit")]
pub async fn edit_delegate(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let id = id.into_inner();
    let action = state.delegations.edit(id).await;
    render(&state, &context(&state, &req), id, action).await
}

#[post("/delegations/{id}/cancel")]
pub async fn cancel_edit(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let id = id.into_inner();
    let action = state.delegations.cancel(id);
    render(&state, &context(&state, &req), id, action).await
}

#[put("/delegations/{id}/input")]
pub async fn set_input(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    body: web::Json<InputRequest>,
) -> Result<HttpResponse, CustomError> {
    let id = id.into_inner();
    let action = state.delegations.set_input(id, &body.address);
    render(&state, &context(&state, &req), id, action).await
}

#[post("/delegations/{id}/reset")]
pub async fn reset_input(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let id = id.into_inner();
    let action = state.delegations.reset(id);
    render(&state, &context(&state, &req), id, action).await
}

#[post("/delegations/{id}/submit")]
pub async fn submit_delegate(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let ctx = context(&state, &req);
    let id = id.into_inner();
    let action = state.delegations.submit(id, &ctx.wallet).await;
    render(&state, &ctx, id, action).await
}

#[delete("/delegations/{id}")]
pub async fn close_panel(
    req: HttpRequest,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let id = id.into_inner();
    let result = state.delegations.close(id);
    guarded(&state, &context(&state, &req), result).map(|_| success_response(id))
}
