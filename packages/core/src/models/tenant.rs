// Арендатор, KYC документы и запись о проживании

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Статус проверки KYC документа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    Pending,
    Submitted,
    Verified,
    Rejected,
}

/// KYC документ арендатора
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kyc {
    pub id: String,
    pub document_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_no: Option<String>,
    pub document_url: String,
    pub status: KycStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// Профиль арендатора (непрозрачная для ядра запись, приходит из /auth/me)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub kycs: Vec<Kyc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StayStatus {
    Active,
    Vacated,
    Terminated,
}

/// Активное проживание арендатора (открывает доступ к функциям "только для жильцов")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub pg_id: String,
    pub tenant_id: String,
    pub room_id: String,
    pub rent: f64,
    pub deposit: f64,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StayStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_minimal_payload() {
        let tenant: Tenant = serde_json::from_str(r#"{"id":"t1","fullName":"Asha Rao"}"#).unwrap();
        assert_eq!(tenant.full_name, "Asha Rao");
        assert!(tenant.kycs.is_empty());
        assert!(tenant.email.is_none());
    }

    #[test]
    fn test_stay_record_payload() {
        let json = r#"{"pgId":"pg1","tenantId":"t1","roomId":"101","rent":8500,
                       "deposit":17000,"startDate":"2026-02-01","status":"ACTIVE"}"#;
        let stay: StayRecord = serde_json::from_str(json).unwrap();
        assert_eq!(stay.status, Some(StayStatus::Active));
        assert_eq!(stay.rent, 8500.0);
    }
}
