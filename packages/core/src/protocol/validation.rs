// Валидация входных данных
//
// Всё здесь выполняется до сетевого вызова: ошибка валидации
// никогда не доходит до бэкенда.

use crate::config::Config;
use crate::protocol::messages::RegisterData;
use crate::protocol::wire::MediaFile;
use crate::utils::error::{PortalError, Result};
use std::fmt;

/// Обязательное текстовое поле (после trim не пустое)
pub fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PortalError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

/// Валидация идентификатора ресурса, который подставляется в путь
pub fn validate_resource_id(field: &str, id: &str) -> Result<()> {
    require_text(field, id)?;
    if id.contains(['/', '?', '#']) || id.chars().any(char::is_whitespace) {
        return Err(PortalError::ValidationError(format!("{} is malformed", field)));
    }
    Ok(())
}

/// Валидация пароля по минимальной длине
pub fn validate_password(password: &str, cfg: &Config) -> Result<()> {
    if password.len() < cfg.password_min_length {
        return Err(PortalError::ValidationError(format!(
            "Password must be at least {} characters",
            cfg.password_min_length
        )));
    }
    Ok(())
}

/// Валидация формы регистрации
pub fn validate_registration(form: &RegisterData, cfg: &Config) -> Result<()> {
    if form.full_name.trim().is_empty() || form.password.is_empty() {
        return Err(PortalError::ValidationError(
            "Please fill required fields".to_string(),
        ));
    }

    if form.email.trim().is_empty() && form.phone.trim().is_empty() {
        return Err(PortalError::ValidationError(
            "Email or phone required".to_string(),
        ));
    }

    validate_password(&form.password, cfg)
}

/// Черновик жалобы: заголовок и описание обязательны
pub fn validate_complaint_draft(title: &str, description: &str) -> Result<()> {
    if title.trim().is_empty() || description.trim().is_empty() {
        return Err(PortalError::ValidationError(
            "Title and Description are required".to_string(),
        ));
    }
    Ok(())
}

/// Комментарий: нужен текст или хотя бы одно вложение
pub fn validate_comment(message: &str, media: &[MediaFile]) -> Result<()> {
    if message.trim().is_empty() && media.is_empty() {
        return Err(PortalError::ValidationError(
            "Comment needs a message or at least one attachment".to_string(),
        ));
    }
    Ok(())
}

/// Код PG, введённый вручную или полученный из QR
///
/// Код подставляется в путь `/pg/:code`, поэтому допускаются
/// только `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PgCode(String);

impl PgCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(PortalError::ValidationError("PG code is required".to_string()));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(PortalError::ValidationError(format!(
                "Invalid PG code: {}",
                code
            )));
        }
        Ok(Self(code.to_string()))
    }

    /// Текст, декодированный из QR внешним сканером.
    ///
    /// QR содержит либо сам код, либо ссылку вида `https://.../pg/<code>`.
    pub fn from_scan(decoded: &str) -> Result<Self> {
        let text = decoded.trim().trim_end_matches('/');
        let candidate = match text.rfind("/pg/") {
            Some(idx) => &text[idx + "/pg/".len()..],
            None => text,
        };
        Self::parse(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
