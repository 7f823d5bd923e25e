// API жалоб: создание, список, детали, комментарии, повторное открытие

use crate::auth::AuthenticatedClient;
use crate::models::{Comment, Complaint, ComplaintCategory, ComplaintPriority};
use crate::protocol::messages::fields;
use crate::protocol::paths;
use crate::protocol::transport::HttpTransport;
use crate::protocol::validation::{validate_comment, validate_complaint_draft, validate_resource_id};
use crate::protocol::wire::{ApiRequest, MediaFile, MultipartForm};
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{info, instrument};

/// Черновик новой жалобы
#[derive(Debug, Clone, Default)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    /// `None` → OTHER
    pub category: Option<ComplaintCategory>,
    /// `None` → MEDIUM
    pub priority: Option<ComplaintPriority>,
    pub pg_id: Option<String>,
    pub media: Vec<MediaFile>,
}

impl NewComplaint {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: ComplaintCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn priority(mut self, priority: ComplaintPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn pg(mut self, pg_id: impl Into<String>) -> Self {
        self.pg_id = Some(pg_id.into());
        self
    }

    pub fn attach(mut self, file: MediaFile) -> Self {
        self.media.push(file);
        self
    }

    fn into_form(self) -> MultipartForm {
        let form = MultipartForm::new()
            .text(fields::TITLE, self.title.trim())
            .text(fields::DESCRIPTION, self.description.trim())
            .text(fields::CATEGORY, self.category.unwrap_or_default().as_str())
            .text(fields::PRIORITY, self.priority.unwrap_or_default().as_str());
        let form = match self.pg_id {
            Some(pg_id) => form.text(fields::PG_ID, pg_id),
            None => form,
        };
        form.files(fields::MEDIA, self.media)
    }
}

/// Менеджер жизненного цикла жалоб.
///
/// Все изменения идут через слой авторизованного доступа. Статусы, кроме
/// REOPENED, меняет только сервер.
pub struct ComplaintManager<T: HttpTransport> {
    client: Arc<AuthenticatedClient<T>>,
}

impl<T: HttpTransport> ComplaintManager<T> {
    pub fn new(client: Arc<AuthenticatedClient<T>>) -> Self {
        Self { client }
    }

    /// Создать жалобу (одним multipart запросом)
    #[instrument(skip(self, draft), fields(media = draft.media.len()))]
    pub async fn create(&self, draft: NewComplaint) -> Result<Complaint> {
        validate_complaint_draft(&draft.title, &draft.description)?;

        let request = ApiRequest::post(paths::COMPLAINTS).multipart(draft.into_form());
        let complaint: Complaint = self.client.call(request).await?.data()?;

        info!(complaint_id = %complaint.id, "complaint created");
        Ok(complaint)
    }

    /// Жалобы арендатора, опционально с фильтром по заголовку
    pub async fn list_for_tenant(&self, filter: Option<&str>) -> Result<Vec<Complaint>> {
        let complaints: Vec<Complaint> = self
            .client
            .call(ApiRequest::get(paths::COMPLAINTS))
            .await?
            .data_or_default()?;

        Ok(match filter.map(str::trim).filter(|f| !f.is_empty()) {
            Some(filter) => complaints
                .into_iter()
                .filter(|c| c.title_matches(filter))
                .collect(),
            None => complaints,
        })
    }

    pub async fn get_details(&self, complaint_id: &str) -> Result<Complaint> {
        validate_resource_id("complaint id", complaint_id)?;
        self.client
            .call(ApiRequest::get(paths::complaint(complaint_id)))
            .await?
            .data()
    }

    /// Комментарий (текст и/или вложения). Статус жалобы не меняется.
    #[instrument(skip(self, message, media), fields(media = media.len()))]
    pub async fn add_comment(
        &self,
        complaint_id: &str,
        message: &str,
        media: Vec<MediaFile>,
    ) -> Result<Comment> {
        validate_resource_id("complaint id", complaint_id)?;
        validate_comment(message, &media)?;

        let form = MultipartForm::new()
            .text(fields::MESSAGE, message.trim())
            .files(fields::MEDIA, media);
        let request = ApiRequest::post(paths::comments(complaint_id)).multipart(form);
        self.client.call(request).await?.data()
    }

    /// Повторно открыть жалобу (только из RESOLVED или CLOSED)
    pub async fn reopen(&self, complaint_id: &str) -> Result<Complaint> {
        let complaint = self.get_details(complaint_id).await?;
        self.reopen_checked(&complaint).await
    }

    /// То же, что `reopen`, для уже загруженной жалобы
    #[instrument(skip(self, complaint), fields(complaint_id = %complaint.id, status = %complaint.status))]
    pub async fn reopen_checked(&self, complaint: &Complaint) -> Result<Complaint> {
        complaint.status.reopen()?;

        self.client
            .call(ApiRequest::patch(paths::reopen(&complaint.id)))
            .await?;
        info!("complaint reopened");

        self.get_details(&complaint.id).await
    }
}
