// PG (объект проживания) и заявки на заселение

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverImage {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PgDetails {
    #[serde(default)]
    pub pg_type: Option<String>,
    #[serde(default)]
    pub mess_available: Option<bool>,
    #[serde(default)]
    pub mess_type: Option<String>,
    #[serde(default)]
    pub rent_start: Option<f64>,
    #[serde(default)]
    pub rent_upto: Option<f64>,
    #[serde(default)]
    pub contact_number: Option<String>,
}

/// Объект проживания, найденный по коду / QR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pg {
    pub id: String,
    pub pg_code: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    #[serde(default)]
    pub details: Option<PgDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Заявка арендатора на заселение в PG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pg: Pg,
}
