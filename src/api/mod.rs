use actix_web::{http::header, web, HttpRequest};

use crate::errors::CustomError;
use crate::models::wallet::WalletSession;
use crate::services::{i18n::Locale, wallet_service::WalletService};
use crate::state::AppState;

mod delegation_handlers;
mod handlers;
mod withdrawal_handlers;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(handlers::list_pools)
            .service(handlers::get_balances)
            .service(handlers::get_transaction)
            .service(handlers::get_header)
            .service(handlers::set_language)
            .service(handlers::clear_storage)
            .service(withdrawal_handlers::start_withdrawal)
            .service(withdrawal_handlers::get_withdrawal)
            .service(withdrawal_handlers::preview_withdrawal)
            .service(withdrawal_handlers::submit_amount)
            .service(withdrawal_handlers::go_back)
            .service(withdrawal_handlers::set_exit_fee_approval)
            .service(withdrawal_handlers::confirm_withdrawal)
            .service(withdrawal_handlers::dismiss_withdrawal)
            .service(delegation_handlers::open_panel)
            .service(delegation_handlers::get_panel)
            .service(delegation_handlers::edit_delegate)
            .service(delegation_handlers::cancel_edit)
            .service(delegation_handlers::set_input)
            .service(delegation_handlers::reset_input)
            .service(delegation_handlers::submit_delegate)
            .service(delegation_handlers::close_panel),
    );
}

pub(crate) const LANGUAGE_COOKIE: &str = "language";

/// Wallet and language of the browser behind one request.
pub(crate) struct RequestContext<'a> {
    pub wallet: WalletSession,
    pub locale: Locale<'a>,
}

/// Language preference order: the `language` cookie set by the settings
/// picker, then `Accept-Language`, then the configured default.
pub(crate) fn context<'a>(state: &'a AppState, req: &HttpRequest) -> RequestContext<'a> {
    let cookie = req.cookie(LANGUAGE_COOKIE).map(|c| c.value().to_string());
    let accepted = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(|tag| tag.split(';').next().unwrap_or_default().to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    RequestContext {
        wallet: WalletService::session_from_request(req),
        locale: state.i18n.locale(cookie.into_iter().chain(accepted)),
    }
}

/// Runs a handler body behind the error boundary and turns form errors into
/// localized messages.
pub(crate) fn guarded<T>(
    state: &AppState,
    ctx: &RequestContext<'_>,
    result: Result<T, CustomError>,
) -> Result<T, CustomError> {
    let result = result.map_err(|e| match e {
        CustomError::AmountValidation(e) => CustomError::FormError {
            field: "amount",
            message: ctx.locale.t(e.message_key()),
        },
        CustomError::AddressValidation(e) => CustomError::FormError {
            field: "address",
            message: ctx.locale.t(e.message_key()),
        },
        e => e,
    });
    state.boundary.guard(result, ctx.wallet.wallet_name.as_deref())
}
