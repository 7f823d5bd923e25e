// Публичный API портала арендатора
// Высокоуровневые методы: сессия, жалобы, профиль, поиск PG

pub mod complaints;
pub mod pg;
pub mod tenant;

pub use complaints::{ComplaintManager, NewComplaint};
pub use pg::PgAPI;
pub use tenant::{KycSubmission, TenantAPI};

use crate::auth::AuthenticatedClient;
use crate::config::Config;
use crate::protocol::transport::{HttpTransport, ReqwestTransport};
use crate::state::{SessionManager, SessionSnapshot};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Главный API портала.
///
/// Один `AuthenticatedClient` на всё приложение: очередь refresh общая для
/// сессии, жалоб, профиля и PG.
pub struct PortalAPI<T: HttpTransport> {
    config: Config,
    client: Arc<AuthenticatedClient<T>>,
    session: Arc<SessionManager<T>>,
    complaints: ComplaintManager<T>,
    tenant: TenantAPI<T>,
    pg: PgAPI<T>,
    auth_listener: Option<JoinHandle<()>>,
}

impl PortalAPI<ReqwestTransport> {
    /// API поверх настоящего HTTP (reqwest + cookie-jar)
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ReqwestTransport::new(config)?, config))
    }
}

impl<T: HttpTransport> PortalAPI<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        let client = Arc::new(AuthenticatedClient::new(transport, config));
        let session = Arc::new(SessionManager::new(Arc::clone(&client), config));

        Self {
            config: config.clone(),
            complaints: ComplaintManager::new(Arc::clone(&client)),
            tenant: TenantAPI::new(Arc::clone(&client), Arc::clone(&session), config),
            pg: PgAPI::new(Arc::clone(&client)),
            client,
            session,
            auth_listener: None,
        }
    }

    /// Инициализация: подписка сессии на события слоя доступа и
    /// тихое восстановление сессии
    pub async fn initialize(&mut self) -> Result<SessionSnapshot> {
        if self.auth_listener.is_none() {
            let events = self.client.subscribe();
            let session = Arc::clone(&self.session);
            self.auth_listener = Some(tokio::spawn(async move {
                session.track_auth_events(events).await;
            }));
        }

        let snapshot = self.session.restore().await;
        info!(authenticated = snapshot.is_authenticated(), "portal initialized");
        Ok(snapshot)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &AuthenticatedClient<T> {
        &self.client
    }

    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    pub fn complaints(&self) -> &ComplaintManager<T> {
        &self.complaints
    }

    pub fn tenant(&self) -> &TenantAPI<T> {
        &self.tenant
    }

    pub fn pg(&self) -> &PgAPI<T> {
        &self.pg
    }

    /// Удалить аккаунт; сессия завершается
    pub async fn delete_account(&self) -> Result<()> {
        self.tenant.delete_account().await
    }
}

impl<T: HttpTransport> Drop for PortalAPI<T> {
    fn drop(&mut self) {
        if let Some(listener) = self.auth_listener.take() {
            listener.abort();
        }
    }
}
