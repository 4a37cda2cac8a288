use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong while serving a request or running domain logic.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[cfg(feature = "ssr")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[cfg(feature = "ssr")]
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse categories the front-end branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Network,
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    Unknown,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Network(_) => ErrorKind::Network,
            AppError::Validation(_) | AppError::Serialization(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            #[cfg(feature = "ssr")]
            AppError::Token(_) => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::Conflict(_) => ErrorKind::Conflict,
            #[cfg(feature = "ssr")]
            AppError::Database(_) => ErrorKind::Unknown,
            AppError::Internal(_) => ErrorKind::Unknown,
        }
    }

    /// The message shown to end users, in Portuguese like the rest of the site.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Network => "Problema de conexão. Tente novamente.",
            ErrorKind::Validation => "Dados inválidos fornecidos.",
            ErrorKind::NotFound => "Informação não encontrada.",
            ErrorKind::Unauthorized => "Sessão inválida. Inicie sessão novamente.",
            ErrorKind::Forbidden => "Não tem permissão para esta ação.",
            ErrorKind::Conflict => "Esta ação entra em conflito com dados existentes.",
            ErrorKind::Unknown => "Ocorreu um erro inesperado. Tente novamente.",
        }
    }
}

#[cfg(feature = "ssr")]
#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: String,
    #[serde(rename = "type")]
    kind: ErrorKind,
    message: &'a str,
}

#[cfg(feature = "ssr")]
impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self.kind() {
            ErrorKind::Network => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            leptos::logging::error!("[API] {}", self);
        } else {
            leptos::logging::log!("[API] Request refused ({}): {}", status.as_u16(), self);
        }

        // Internal details stay in the log.
        let detail = match self.kind() {
            ErrorKind::Unknown => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        let mut response = actix_web::HttpResponse::build(status);
        if status == actix_web::http::StatusCode::UNAUTHORIZED {
            response.insert_header(("WWW-Authenticate", "Bearer"));
        }
        response.json(ErrorBody {
            detail,
            kind: self.kind(),
            message: self.user_message(),
        })
    }
}

impl AppError {
    /// Server functions surface the user-facing message; details go to the log.
    pub fn into_server_fn_error(self) -> leptos::ServerFnError {
        leptos::logging::error!("[SERVER] {}", self);
        leptos::ServerFnError::ServerError(self.user_message().to_string())
    }
}
