//! HTTP handlers and response shapes.
//!
//! Every response carries a `success` boolean. Business outcomes —
//! including failures such as a wrong password or a taken email — are
//! HTTP 200 so callers branch on `success` uniformly; only backend and
//! unanticipated errors become 500, with a generic message and the
//! detail logged server-side.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use passbook_core::PassbookError;
use passbook_core::models::account::{AccountSummary, CreatedAccount};
use passbook_core::store::RecordStore;
use passbook_service::Scope;

use crate::app::AppState;

#[derive(Debug, Serialize)]
struct Envelope {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize)]
struct DomainCreated {
    success: bool,
    domain: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct UserEnvelope<T: Serialize> {
    success: bool,
    message: String,
    user: T,
}

#[derive(Debug, Serialize)]
struct UserList {
    success: bool,
    count: usize,
    users: Vec<AccountSummary>,
}

#[derive(Debug, Serialize)]
struct Liveness {
    success: bool,
    message: String,
    time: DateTime<Utc>,
}

fn error_response(err: PassbookError) -> Response {
    if err.is_business() {
        (
            StatusCode::OK,
            Json(Envelope {
                success: false,
                message: err.to_string(),
            }),
        )
            .into_response()
    } else {
        tracing::error!(error = %err, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope {
                success: false,
                message: "internal error".into(),
            }),
        )
            .into_response()
    }
}

fn ok(message: &str) -> Response {
    Json(Envelope {
        success: true,
        message: message.into(),
    })
    .into_response()
}

pub async fn create_domain<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> Response {
    match state.service.registry().create_domain(&name).await {
        Ok(created) => Json(DomainCreated {
            success: true,
            domain: created.name,
            api_key: created.api_key,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn create_account<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path((domain, email, password, api_key)): Path<(String, String, String, String)>,
) -> Response {
    let scope = Scope::Domain {
        name: &domain,
        api_key: &api_key,
    };
    match state.service.create(scope, &email, &password).await {
        Ok(user) => Json(UserEnvelope::<CreatedAccount> {
            success: true,
            message: "account created".into(),
            user,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn sign_in<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path((domain, email, password, api_key)): Path<(String, String, String, String)>,
) -> Response {
    let scope = Scope::Domain {
        name: &domain,
        api_key: &api_key,
    };
    match state.service.sign_in(scope, &email, &password).await {
        Ok(user) => Json(UserEnvelope::<AccountSummary> {
            success: true,
            message: "signed in".into(),
            user,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn delete_account<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path((domain, email, password, api_key)): Path<(String, String, String, String)>,
) -> Response {
    let scope = Scope::Domain {
        name: &domain,
        api_key: &api_key,
    };
    match state.service.delete(scope, &email, &password).await {
        Ok(()) => ok("account deleted"),
        Err(err) => error_response(err),
    }
}

pub async fn reset_password<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path((domain, email, new_password, api_key)): Path<(String, String, String, String)>,
) -> Response {
    let scope = Scope::Domain {
        name: &domain,
        api_key: &api_key,
    };
    match state.service.reset_password(scope, &email, &new_password).await {
        Ok(()) => ok("password updated"),
        Err(err) => error_response(err),
    }
}

pub async fn reset_email<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path((domain, old_email, new_email, api_key)): Path<(String, String, String, String)>,
) -> Response {
    let scope = Scope::Domain {
        name: &domain,
        api_key: &api_key,
    };
    match state.service.reset_email(scope, &old_email, &new_email).await {
        Ok(()) => ok("email updated"),
        Err(err) => error_response(err),
    }
}

pub async fn list_accounts<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path((domain, api_key)): Path<(String, String)>,
) -> Response {
    let scope = Scope::Domain {
        name: &domain,
        api_key: &api_key,
    };
    match state.service.list(scope).await {
        Ok(users) => Json(UserList {
            success: true,
            count: users.len(),
            users,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

// Single-tenant surface: no domain segment, no API key, one implicit
// global collection.

pub async fn create_account_global<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path((email, password)): Path<(String, String)>,
) -> Response {
    match state.service.create(Scope::Global, &email, &password).await {
        Ok(user) => Json(UserEnvelope::<CreatedAccount> {
            success: true,
            message: "account created".into(),
            user,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn sign_in_global<S: RecordStore>(
    State(state): State<AppState<S>>,
    Path((email, password)): Path<(String, String)>,
) -> Response {
    match state.service.sign_in(Scope::Global, &email, &password).await {
        Ok(user) => Json(UserEnvelope::<AccountSummary> {
            success: true,
            message: "signed in".into(),
            user,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn list_accounts_global<S: RecordStore>(
    State(state): State<AppState<S>>,
) -> Response {
    match state.service.list(Scope::Global).await {
        Ok(users) => Json(UserList {
            success: true,
            count: users.len(),
            users,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn wake() -> Response {
    Json(Liveness {
        success: true,
        message: "awake".into(),
        time: Utc::now(),
    })
    .into_response()
}

pub async fn health() -> Response {
    Json(Liveness {
        success: true,
        message: "ok".into(),
        time: Utc::now(),
    })
    .into_response()
}
