// HTTP транспорт
// Абстракция над сетью + реализация поверх reqwest

use crate::config::Config;
use crate::protocol::wire::{ApiRequest, ApiResponse, FormPart, HttpMethod, MultipartForm, RequestBody};
use crate::utils::error::{PortalError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Транспорт, которым слой доступа отправляет запросы.
///
/// Возвращает `Ok` для ЛЮБОГО HTTP статуса: классификацией (401/403/404/...)
/// занимается вызывающая сторона. `Err` — только транспортный сбой.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

// Позволяет держать ссылку на транспорт снаружи (например, на MemoryBackend в тестах)
#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        (**self).send(request).await
    }
}

/// Транспорт поверх `reqwest` с cookie-jar (сессия хранится в cookie, как в браузере)
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Создать транспорт из конфигурации
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .cookie_store(config.with_credentials)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PortalError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Полный URL для пути запроса
    fn build_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    fn to_reqwest_form(form: &MultipartForm) -> Result<reqwest::multipart::Form> {
        let mut out = reqwest::multipart::Form::new();
        for part in form.parts() {
            out = match part {
                FormPart::Text { name, value } => out.text(name.clone(), value.clone()),
                FormPart::File { name, file } => {
                    let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                        .file_name(file.file_name.clone())
                        .mime_str(&file.content_type)
                        .map_err(|e| {
                            PortalError::ValidationError(format!(
                                "Invalid content type {}: {}",
                                file.content_type, e
                            ))
                        })?;
                    out.part(name.clone(), part)
                }
            };
        }
        Ok(out)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(
        request_id = %request.request_id,
        method = %request.method,
        path = %request.path
    ))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.build_url(&request.path);
        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), &url)
            .header("x-request-id", request.request_id.to_string());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(form) => builder.multipart(Self::to_reqwest_form(form)?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        debug!(status, bytes = body.len(), "response received");
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
