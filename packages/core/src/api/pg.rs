// API поиска PG и заявок на заселение

use crate::auth::AuthenticatedClient;
use crate::models::{Application, Pg};
use crate::protocol::messages::ApplicationData;
use crate::protocol::paths;
use crate::protocol::transport::HttpTransport;
use crate::protocol::validation::{validate_resource_id, PgCode};
use crate::protocol::wire::ApiRequest;
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub struct PgAPI<T: HttpTransport> {
    client: Arc<AuthenticatedClient<T>>,
}

impl<T: HttpTransport> PgAPI<T> {
    pub fn new(client: Arc<AuthenticatedClient<T>>) -> Self {
        Self { client }
    }

    /// PG по коду, введённому вручную
    pub async fn find_by_code(&self, raw_code: &str) -> Result<Pg> {
        let code = PgCode::parse(raw_code)?;
        self.fetch(&code).await
    }

    /// PG по тексту, декодированному из QR
    pub async fn find_by_scan(&self, decoded: &str) -> Result<Pg> {
        let code = PgCode::from_scan(decoded)?;
        debug!(%code, "pg code scanned");
        self.fetch(&code).await
    }

    async fn fetch(&self, code: &PgCode) -> Result<Pg> {
        self.client
            .call(ApiRequest::get(paths::pg(code.as_str())))
            .await?
            .data()
    }

    pub async fn submit_application(&self, pg_id: &str, message: Option<&str>) -> Result<Application> {
        validate_resource_id("pg id", pg_id)?;

        let request = ApiRequest::post(paths::APPLICATIONS).json(&ApplicationData {
            pg_id: pg_id.to_string(),
            message: message.map(str::trim).unwrap_or_default().to_string(),
        })?;
        let application: Application = self.client.call(request).await?.data()?;

        info!(application_id = %application.id, pg_id, "application submitted");
        Ok(application)
    }

    pub async fn list_applications(&self) -> Result<Vec<Application>> {
        self.client
            .call(ApiRequest::get(paths::APPLICATIONS))
            .await?
            .data_or_default()
    }
}
