// API профиля арендатора и KYC документов

use crate::auth::AuthenticatedClient;
use crate::config::Config;
use crate::models::{Kyc, Tenant};
use crate::protocol::messages::{fields, PasswordUpdate, ProfileUpdate};
use crate::protocol::paths;
use crate::protocol::transport::HttpTransport;
use crate::protocol::validation::{require_text, validate_password, validate_resource_id};
use crate::protocol::wire::{ApiRequest, MediaFile, MultipartForm};
use crate::state::SessionManager;
use crate::utils::error::{PortalError, Result};
use std::sync::Arc;
use tracing::info;

/// KYC документ для загрузки
#[derive(Debug, Clone, Default)]
pub struct KycSubmission {
    pub document_type: String,
    pub document_no: Option<String>,
    pub document_file: Option<MediaFile>,
}

impl KycSubmission {
    fn into_form(self) -> MultipartForm {
        let mut form = MultipartForm::new();
        if !self.document_type.trim().is_empty() {
            form = form.text(fields::DOCUMENT_TYPE, self.document_type.trim());
        }
        if let Some(document_no) = self.document_no {
            form = form.text(fields::DOCUMENT_NO, document_no.trim());
        }
        if let Some(file) = self.document_file {
            form = form.file(fields::DOCUMENT_FILE, file);
        }
        form
    }
}

pub struct TenantAPI<T: HttpTransport> {
    client: Arc<AuthenticatedClient<T>>,
    session: Arc<SessionManager<T>>,
    config: Config,
}

impl<T: HttpTransport> TenantAPI<T> {
    pub fn new(
        client: Arc<AuthenticatedClient<T>>,
        session: Arc<SessionManager<T>>,
        config: &Config,
    ) -> Self {
        Self {
            client,
            session,
            config: config.clone(),
        }
    }

    /// Частичное обновление профиля
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Tenant> {
        if update.is_empty() {
            return Err(PortalError::ValidationError("Nothing to update".to_string()));
        }
        if let Some(full_name) = &update.full_name {
            require_text("full name", full_name)?;
        }

        let request = ApiRequest::patch(paths::TENANT_ME).json(&update)?;
        let tenant: Tenant = self.client.call(request).await?.data()?;
        self.session.update_tenant(tenant.clone());
        Ok(tenant)
    }

    pub async fn update_password(&self, current: &str, new: &str) -> Result<()> {
        if current.is_empty() || new.is_empty() {
            return Err(PortalError::ValidationError(
                "Both current and new passwords are required".to_string(),
            ));
        }
        validate_password(new, &self.config)?;

        let request = ApiRequest::patch(paths::TENANT_PASSWORD).json(&PasswordUpdate {
            current_pass: current.to_string(),
            new_pass: new.to_string(),
        })?;
        self.client.call(request).await?;
        info!("password updated");
        Ok(())
    }

    pub async fn upload_profile_image(&self, image: MediaFile) -> Result<Tenant> {
        let form = MultipartForm::new().file(fields::PROFILE_IMAGE, image);
        let request = ApiRequest::patch(paths::TENANT_PROFILE_IMAGE).multipart(form);
        let tenant: Tenant = self.client.call(request).await?.data()?;
        self.session.update_tenant(tenant.clone());
        Ok(tenant)
    }

    /// Удалить аккаунт и завершить сессию
    pub async fn delete_account(&self) -> Result<()> {
        self.client.call(ApiRequest::delete(paths::TENANT_ME)).await?;
        self.session.clear();
        info!("tenant account deleted");
        Ok(())
    }

    pub async fn create_kyc(&self, submission: KycSubmission) -> Result<Kyc> {
        require_text("document type", &submission.document_type)?;
        if submission.document_file.is_none() {
            return Err(PortalError::ValidationError(
                "Document file is required".to_string(),
            ));
        }

        let request = ApiRequest::post(paths::KYC).multipart(submission.into_form());
        self.client.call(request).await?.data()
    }

    /// Заменить данные документа; незаданные поля остаются прежними
    pub async fn update_kyc(&self, kyc_id: &str, submission: KycSubmission) -> Result<Kyc> {
        validate_resource_id("kyc id", kyc_id)?;
        let request = ApiRequest::patch(paths::kyc(kyc_id)).multipart(submission.into_form());
        self.client.call(request).await?.data()
    }

    pub async fn delete_kyc(&self, kyc_id: &str) -> Result<()> {
        validate_resource_id("kyc id", kyc_id)?;
        self.client.call(ApiRequest::delete(paths::kyc(kyc_id))).await?;
        Ok(())
    }
}
