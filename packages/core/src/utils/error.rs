// Типы ошибок

use thiserror::Error;

/// Ошибка портала.
///
/// `Clone` нужен слою доступа: один исход refresh рассылается
/// всем запросам, ожидающим в очереди.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    /// Повторная аутентификация не удалась, сессия завершена.
    /// UI должен перенаправить на страницу входа.
    #[error("Session expired: {0}")]
    AuthExpired(String),

    /// Нарушено условие, проверяемое на клиенте (до любого сетевого вызова)
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Остальные 4xx ответы бэкенда
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Недопустимый переход статуса жалобы
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Транспортная ошибка (таймаут, нет соединения). Никогда не запускает refresh.
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl PortalError {
    /// Сессия завершена и требуется повторный вход
    pub fn is_session_terminated(&self) -> bool {
        matches!(self, PortalError::AuthExpired(_))
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            PortalError::SerializationError(error.to_string())
        } else if error.is_builder() {
            PortalError::InternalError(error.to_string())
        } else {
            // timeout, connect, request, body
            PortalError::NetworkError(error.to_string())
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(error: serde_json::Error) -> Self {
        PortalError::SerializationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_terminated_only_for_auth_expired() {
        assert!(PortalError::AuthExpired("refresh failed".to_string()).is_session_terminated());
        assert!(!PortalError::Forbidden("nope".to_string()).is_session_terminated());
        assert!(!PortalError::NetworkError("timeout".to_string()).is_session_terminated());
    }

    #[test]
    fn test_serde_json_error_maps_to_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let portal: PortalError = err.into();
        assert!(matches!(portal, PortalError::SerializationError(_)));
    }

    #[test]
    fn test_display_is_human_readable() {
        let err = PortalError::ValidationError("Title is required".to_string());
        assert_eq!(err.to_string(), "Validation error: Title is required");
    }
}
