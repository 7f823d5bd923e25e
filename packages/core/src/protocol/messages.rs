// Тела запросов и ответов REST API
// Соответствуют контракту бэкенда (JSON, camelCase)

use crate::models::{Gender, StayRecord, Tenant};
use serde::{Deserialize, Serialize};

// ============================================================================
// Auth
// ============================================================================

/// Данные для входа (`identifier` — email или телефон)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub identifier: String,
    pub password: String,
}

/// Данные для регистрации
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
}

impl RegisterData {
    /// Идентификатор для входа сразу после регистрации: email, иначе телефон
    pub fn login_identifier(&self) -> &str {
        if self.email.is_empty() {
            &self.phone
        } else {
            &self.email
        }
    }

    /// Копия с обрезанными пробелами (пароль не трогаем)
    pub fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// Ответ `/auth/me`: арендатор и активное проживание
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub tenant: Tenant,
    #[serde(default, rename = "stayRecords", alias = "stayRecord")]
    pub stay: Option<StayRecord>,
}

// ============================================================================
// Tenant profile
// ============================================================================

/// Частичное обновление профиля (отправляются только заданные поля)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.date_of_birth.is_none()
            && self.gender.is_none()
    }
}

/// Смена пароля
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate {
    pub current_pass: String,
    pub new_pass: String,
}

// ============================================================================
// Applications
// ============================================================================

/// Заявка на заселение
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationData {
    pub pg_id: String,
    #[serde(default)]
    pub message: String,
}

/// Имена полей multipart форм
pub mod fields {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "category";
    pub const PRIORITY: &str = "priority";
    pub const PG_ID: &str = "pgId";
    pub const MEDIA: &str = "media";
    pub const MESSAGE: &str = "message";
    pub const PROFILE_IMAGE: &str = "profileImage";
    pub const DOCUMENT_TYPE: &str = "documentType";
    pub const DOCUMENT_NO: &str = "documentNo";
    pub const DOCUMENT_FILE: &str = "documentFile";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_identifier_prefers_email() {
        let mut data = RegisterData {
            full_name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9999999999".to_string(),
            password: "secret123".to_string(),
        };
        assert_eq!(data.login_identifier(), "asha@example.com");

        data.email.clear();
        assert_eq!(data.login_identifier(), "9999999999");
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            phone: Some("9876543210".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"phone": "9876543210"}));
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_me_response_accepts_stay_records_key() {
        let json = r#"{"tenant":{"id":"t1","fullName":"Asha"},
                       "stayRecords":{"pgId":"p","tenantId":"t1","roomId":"1","rent":1,"deposit":2,"startDate":"2026-01-01"}}"#;
        let me: MeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(me.stay.unwrap().room_id, "1");

        let me: MeResponse = serde_json::from_str(r#"{"tenant":{"id":"t1","fullName":"Asha"}}"#).unwrap();
        assert!(me.stay.is_none());
    }
}
