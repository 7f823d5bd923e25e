// Сессия арендатора: кто вошёл и есть ли активное проживание
//
// Единственный писатель снимка сессии. Наблюдатели (UI, маршрутизация)
// подписываются через watch-канал.

use crate::auth::{AuthEvent, AuthenticatedClient};
use crate::config::Config;
use crate::models::{StayRecord, Tenant};
use crate::protocol::messages::{LoginData, MeResponse, RegisterData};
use crate::protocol::paths;
use crate::protocol::transport::HttpTransport;
use crate::protocol::validation::{require_text, validate_registration};
use crate::protocol::wire::ApiRequest;
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

/// Снимок сессии
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub tenant: Option<Tenant>,
    pub stay: Option<StayRecord>,
    /// Идёт восстановление сессии
    pub loading: bool,
}

impl SessionSnapshot {
    /// Состояние при старте: сессия ещё не проверена
    pub fn restoring() -> Self {
        Self {
            tenant: None,
            stay: None,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            tenant: None,
            stay: None,
            loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tenant.is_some()
    }

    /// Доступны функции "только для жильцов"
    pub fn has_active_stay(&self) -> bool {
        self.stay.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::restoring()
    }
}

/// Менеджер сессии
pub struct SessionManager<T: HttpTransport> {
    client: Arc<AuthenticatedClient<T>>,
    config: Config,
    session: watch::Sender<SessionSnapshot>,
}

impl<T: HttpTransport> SessionManager<T> {
    pub fn new(client: Arc<AuthenticatedClient<T>>, config: &Config) -> Self {
        let (session, _) = watch::channel(SessionSnapshot::restoring());
        Self {
            client,
            config: config.clone(),
            session,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    /// Тихое восстановление сессии при запуске
    pub async fn restore(&self) -> SessionSnapshot {
        self.session.send_modify(|s| s.loading = true);
        self.refresh_tenant().await
    }

    /// Перечитать `/auth/me`. Любая ошибка означает, что сессии нет.
    #[instrument(skip(self))]
    pub async fn refresh_tenant(&self) -> SessionSnapshot {
        match self.fetch_me().await {
            Ok(me) => {
                debug!(tenant_id = %me.tenant.id, has_stay = me.stay.is_some(), "session restored");
                self.establish(me)
            }
            Err(e) => {
                debug!(error = %e, "no active session");
                self.clear();
                SessionSnapshot::signed_out()
            }
        }
    }

    async fn fetch_me(&self) -> Result<MeResponse> {
        self.client.call(ApiRequest::get(paths::ME)).await?.json()
    }

    fn establish(&self, me: MeResponse) -> SessionSnapshot {
        let snapshot = SessionSnapshot {
            tenant: Some(me.tenant),
            stay: me.stay,
            loading: false,
        };
        self.session.send_replace(snapshot.clone());
        snapshot
    }

    /// Вход по email или телефону
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<SessionSnapshot> {
        require_text("identifier", identifier)?;
        require_text("password", password)?;

        let request = ApiRequest::post(paths::LOGIN).json(&LoginData {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
        })?;
        self.client.send_public(request).await?;

        // Ошибка /auth/me после входа отдаётся как есть (сеть, 5xx, ...)
        let me = match self.fetch_me().await {
            Ok(me) => me,
            Err(e) => {
                warn!(error = %e, "profile fetch after login failed");
                self.clear();
                return Err(e);
            }
        };
        let snapshot = self.establish(me);
        info!("tenant logged in");
        Ok(snapshot)
    }

    /// Регистрация и сразу вход
    pub async fn register(&self, form: &RegisterData) -> Result<SessionSnapshot> {
        let form = form.trimmed();
        validate_registration(&form, &self.config)?;

        let request = ApiRequest::post(paths::REGISTER).json(&form)?;
        self.client.send_public(request).await?;
        info!("tenant registered");

        self.login(form.login_identifier(), &form.password).await
    }

    /// Выход. Сессия очищается даже если бэкенд не ответил.
    pub async fn logout(&self) {
        if let Err(e) = self.client.send_public(ApiRequest::post(paths::LOGOUT)).await {
            warn!(error = %e, "logout request failed, clearing session anyway");
        }
        self.clear();
        info!("tenant logged out");
    }

    pub fn clear(&self) {
        self.session.send_replace(SessionSnapshot::signed_out());
    }

    /// Обновить профиль в снимке (после изменения профиля на бэкенде)
    pub fn update_tenant(&self, tenant: Tenant) {
        self.session.send_modify(|s| {
            if s.tenant.is_some() {
                s.tenant = Some(tenant);
            }
        });
    }

    /// Слушать события слоя доступа: провал refresh завершает сессию
    pub async fn track_auth_events(&self, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(AuthEvent::Expired) => {
                    warn!("session expired");
                    self.clear();
                }
                Ok(AuthEvent::Refreshed) => debug!("session refreshed"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::memory::MemoryBackend;
    use crate::protocol::wire::HttpMethod;
    use crate::utils::error::PortalError;

    fn manager() -> (Arc<MemoryBackend>, SessionManager<Arc<MemoryBackend>>) {
        let backend = Arc::new(MemoryBackend::new());
        let cfg = Config::default();
        let client = Arc::new(AuthenticatedClient::new(backend.clone(), &cfg));
        (backend, SessionManager::new(client, &cfg))
    }

    #[test]
    fn test_initial_snapshot_is_loading() {
        let (_backend, session) = manager();
        let snapshot = session.snapshot();
        assert!(snapshot.loading);
        assert!(!snapshot.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_without_session_signs_out() {
        let (_backend, session) = manager();
        let snapshot = session.restore().await;

        assert!(!snapshot.loading);
        assert!(!snapshot.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_requires_credentials_before_network() {
        let (backend, session) = manager();
        let result = session.login("  ", "secret123").await;

        assert!(matches!(result, Err(PortalError::ValidationError(_))));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let (backend, session) = manager();
        backend.seed_account("Asha Rao", "asha@example.com", "secret123");

        let snapshot = session.login("asha@example.com", "secret123").await.unwrap();
        assert_eq!(snapshot.tenant.unwrap().full_name, "Asha Rao");
        assert!(session.is_authenticated());

        session.logout().await;
        assert!(!session.is_authenticated());
        assert_eq!(backend.count(HttpMethod::Post, paths::LOGOUT), 1);
    }

    #[tokio::test]
    async fn test_bad_credentials_propagate() {
        let (backend, session) = manager();
        backend.seed_account("Asha Rao", "asha@example.com", "secret123");

        let result = session.login("asha@example.com", "wrong").await;
        assert!(matches!(result, Err(PortalError::AuthExpired(_))));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_profile_failure_after_login_keeps_its_error() {
        let (backend, session) = manager();
        backend.seed_account("Asha Rao", "asha@example.com", "secret123");
        backend.fail_next(HttpMethod::Get, paths::ME, 503);

        let result = session.login("asha@example.com", "secret123").await;

        assert!(matches!(result, Err(PortalError::ServerError(_))));
        assert!(!session.is_authenticated());
        assert!(!session.snapshot().loading);
        assert_eq!(backend.count(HttpMethod::Post, paths::REFRESH), 0);
    }
}
