// Wire format: описание HTTP запросов/ответов независимо от транспорта
//
// Запрос полностью владеет своим телом (включая файлы multipart),
// поэтому его можно повторить после refresh без участия вызывающего кода.

use crate::utils::error::{PortalError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// HTTP метод
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Бинарный файл для multipart (содержимое для ядра непрозрачно)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Одна часть multipart формы
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: MediaFile },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Multipart форма (порядок частей сохраняется)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: MediaFile) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file,
        });
        self
    }

    pub fn files(self, name: &str, files: impl IntoIterator<Item = MediaFile>) -> Self {
        files.into_iter().fold(self, |form, file| form.file(name, file))
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Значение текстового поля по имени (первое вхождение)
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Все файлы с данным именем поля
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MediaFile> + 'a {
        self.parts.iter().filter_map(move |part| match part {
            FormPart::File { name: n, file } if n == name => Some(file),
            _ => None,
        })
    }
}

/// Тело запроса
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// Полностью сформированный HTTP запрос к бэкенду
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Путь относительно базового URL, например `/complaints/42`
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub request_id: Uuid,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            request_id: crate::utils::uuid::new_request_id(),
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// JSON тело
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Запрос уже был повторён после refresh
    pub fn is_retry(&self) -> bool {
        self.retried
    }

    /// Пометить запрос как повторённый (повтор допускается ровно один раз)
    pub fn mark_retry(&mut self) {
        self.retried = true;
    }

    /// Путь без query-строки и завершающего `/`
    pub fn route(&self) -> &str {
        let path = self.path.split('?').next().unwrap_or_default();
        path.trim_end_matches('/')
    }
}

/// Ответ бэкенда (любой HTTP статус)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

#[derive(Deserialize)]
struct OptionalEnvelope<T> {
    #[serde(default)]
    data: Option<T>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Ответ с JSON телом
    pub fn json_body(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn empty(status: u16) -> Self {
        Self::new(status, Vec::new())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401 и 403 оба считаются признаком истёкшей сессии
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// Сообщение об ошибке из тела (`{"message": "..."}`) либо код статуса
    pub fn error_message(&self) -> String {
        serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }

    /// Классифицировать статус: 2xx → `Ok`, остальное → соответствующая ошибка
    pub fn into_result(self) -> Result<ApiResponse> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self.error_message();
        Err(match self.status {
            401 => PortalError::AuthExpired(message),
            403 => PortalError::Forbidden(message),
            404 => PortalError::NotFound(message),
            400..=499 => PortalError::Rejected(message),
            _ => PortalError::ServerError(message),
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Полезная нагрузка в виде `{ "data": T }` или просто `T`
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        match serde_json::from_slice::<Envelope<T>>(&self.body)? {
            Envelope::Wrapped { data } | Envelope::Bare(data) => Ok(data),
        }
    }

    /// `data` из `{ "data": T }`; пустое тело или отсутствующее поле → `T::default()`
    pub fn data_or_default<T: DeserializeOwned + Default>(&self) -> Result<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        let envelope: OptionalEnvelope<T> = serde_json::from_slice(&self.body)?;
        Ok(envelope.data.unwrap_or_default())
    }
}
