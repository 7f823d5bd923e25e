// Модель жалобы (тикета) и её жизненный цикл

use crate::utils::error::{PortalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Статус жалобы
///
/// ```text
///  OPEN ──► IN_PROGRESS ──► RESOLVED ──► CLOSED
///                              │            │
///                              └─► REOPENED ◄┘   (единственный переход, который делает клиент)
/// ```
///
/// Все остальные переходы выполняет сервер, клиент их только наблюдает.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
    Reopened,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Open => "OPEN",
            ComplaintStatus::InProgress => "IN_PROGRESS",
            ComplaintStatus::Resolved => "RESOLVED",
            ComplaintStatus::Closed => "CLOSED",
            ComplaintStatus::Reopened => "REOPENED",
        }
    }

    /// Можно ли предложить пользователю "Reopen"
    pub fn can_reopen(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Closed)
    }

    /// Переход `RESOLVED | CLOSED → REOPENED`.
    ///
    /// REOPENED ведёт себя как OPEN: повторно открыть можно только после
    /// того, как сервер снова переведёт жалобу в RESOLVED/CLOSED.
    pub fn reopen(self) -> Result<ComplaintStatus> {
        if self.can_reopen() {
            Ok(ComplaintStatus::Reopened)
        } else {
            Err(PortalError::InvalidTransition(format!(
                "complaint in status {} cannot be reopened",
                self
            )))
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Приоритет жалобы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl ComplaintPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintPriority::Low => "LOW",
            ComplaintPriority::Medium => "MEDIUM",
            ComplaintPriority::High => "HIGH",
            ComplaintPriority::Urgent => "URGENT",
        }
    }
}

/// Категория жалобы (фиксированный набор)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintCategory {
    Electrical,
    Plumbing,
    Cleaning,
    Internet,
    Food,
    Security,
    Maintenance,
    #[default]
    Other,
}

impl ComplaintCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintCategory::Electrical => "ELECTRICAL",
            ComplaintCategory::Plumbing => "PLUMBING",
            ComplaintCategory::Cleaning => "CLEANING",
            ComplaintCategory::Internet => "INTERNET",
            ComplaintCategory::Food => "FOOD",
            ComplaintCategory::Security => "SECURITY",
            ComplaintCategory::Maintenance => "MAINTENANCE",
            ComplaintCategory::Other => "OTHER",
        }
    }
}

/// Вложение (ссылка на файл во внешнем media store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: String,
    #[serde(alias = "url")]
    pub file_url: String,
    #[serde(alias = "type", default)]
    pub file_type: String,
}

/// Комментарий к жалобе. Неизменяем после создания.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub media: Vec<Media>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_type: Option<String>,
}

/// Запись аудита (пишет только сервер)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

/// Жалоба арендатора
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: ComplaintStatus,
    #[serde(default)]
    pub priority: ComplaintPriority,
    #[serde(default)]
    pub category: ComplaintCategory,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pg_id: Option<String>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Complaint {
    pub fn can_reopen(&self) -> bool {
        self.status.can_reopen()
    }

    /// Совпадает ли заголовок с фильтром (подстрока без учёта регистра)
    pub fn title_matches(&self, filter: &str) -> bool {
        self.title.to_lowercase().contains(&filter.to_lowercase())
    }
}
