// Слой авторизованного доступа: вызовы с cookie сессии + единственный refresh на эпизод

use crate::auth::refresh::{RefreshState, Ticket};
use crate::config::Config;
use crate::protocol::paths;
use crate::protocol::transport::HttpTransport;
use crate::protocol::wire::{ApiRequest, ApiResponse};
use crate::utils::error::{PortalError, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Изменение сессии, замеченное слоем доступа
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Refresh прошёл, ожидавшие запросы повторены
    Refreshed,
    /// Refresh не удался: сессию восстановить нельзя
    Expired,
}

/// HTTP клиент с перехватом 401/403.
///
/// Запрос, получивший 401/403, либо запускает refresh сам (если его ещё нет),
/// либо встаёт в очередь к уже идущему. После успеха каждый запрос повторяется
/// ровно один раз; после провала все получают `AuthExpired`.
pub struct AuthenticatedClient<T: HttpTransport> {
    transport: T,
    refresh: Mutex<RefreshState>,
    events: broadcast::Sender<AuthEvent>,
}

impl<T: HttpTransport> AuthenticatedClient<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        let (events, _) = broadcast::channel(config.auth_event_capacity.max(1));
        Self {
            transport,
            refresh: Mutex::new(RefreshState::default()),
            events,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Подписка на события сессии
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.refresh).is_refreshing()
    }

    /// Сколько запросов ждут окончания refresh
    pub fn pending_count(&self) -> usize {
        lock(&self.refresh).pending()
    }

    /// Вызов без перехвата (login, logout, register)
    pub async fn send_public(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.transport.send(&request).await?.into_result()
    }

    /// Вызов с перехватом 401/403 и повтором после refresh
    #[instrument(skip(self, request), fields(
        request_id = %request.request_id,
        method = %request.method,
        path = %request.path
    ))]
    pub async fn call(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        loop {
            let sent_in = lock(&self.refresh).epoch();
            let response = self.transport.send(&request).await?;

            if !response.is_auth_failure() || paths::is_refresh(request.route()) {
                return response.into_result();
            }

            if request.is_retry() {
                warn!(status = response.status, "authorization failed again after refresh");
                return Err(PortalError::AuthExpired(response.error_message()));
            }

            self.await_refresh(sent_in).await?;
            request.mark_retry();
            debug!("replaying request with renewed session");
        }
    }

    // MutexGuard освобождается до первого await
    async fn await_refresh(&self, sent_in: u64) -> Result<()> {
        let ticket = lock(&self.refresh).join(sent_in);
        match ticket {
            Ticket::Leader => self.lead_refresh().await,
            Ticket::Renewed => {
                debug!("session renewed while request was in flight");
                Ok(())
            }
            waiter @ Ticket::Waiter(_) => {
                debug!("refresh in flight, request queued");
                waiter.outcome().await
            }
        }
    }

    async fn lead_refresh(&self) -> Result<()> {
        let episode = Episode {
            state: &self.refresh,
            settled: false,
        };

        let outcome = self.refresh_session().await;
        let woken = episode.settle(&outcome);

        match &outcome {
            Ok(()) => {
                info!(woken, "session refreshed");
                let _ = self.events.send(AuthEvent::Refreshed);
            }
            Err(e) => {
                warn!(woken, error = %e, "session refresh failed");
                let _ = self.events.send(AuthEvent::Expired);
            }
        }
        outcome
    }

    /// Одна попытка refresh. Любой сбой (статус или сеть) → `AuthExpired`
    async fn refresh_session(&self) -> Result<()> {
        let request = ApiRequest::post(paths::REFRESH);
        match self.transport.send(&request).await {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(PortalError::AuthExpired(response.error_message())),
            Err(e) => Err(PortalError::AuthExpired(format!("session refresh failed: {}", e))),
        }
    }
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// Эпизод refresh, которым владеет лидер. Если future лидера уничтожен до
// завершения, очередь закрывается с AuthExpired и состояние снова Idle.
struct Episode<'a> {
    state: &'a Mutex<RefreshState>,
    settled: bool,
}

impl Episode<'_> {
    fn settle(mut self, outcome: &Result<()>) -> usize {
        self.settled = true;
        lock(self.state).settle(outcome)
    }
}

impl Drop for Episode<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let woken = lock(self.state).settle(&Err(PortalError::AuthExpired(
                "session refresh was cancelled".to_string(),
            )));
            warn!(woken, "session refresh cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::memory::MemoryBackend;
    use crate::protocol::messages::LoginData;
    use crate::protocol::wire::HttpMethod;
    use std::sync::Arc;

    async fn client() -> (Arc<MemoryBackend>, AuthenticatedClient<Arc<MemoryBackend>>) {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed_account("Asha Rao", "asha@example.com", "secret123");
        let client = AuthenticatedClient::new(backend.clone(), &Config::default());

        let login = ApiRequest::post(paths::LOGIN)
            .json(&LoginData {
                identifier: "asha@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .unwrap();
        client.send_public(login).await.unwrap();
        (backend, client)
    }

    #[tokio::test]
    async fn test_valid_session_passes_through() {
        let (backend, client) = client().await;
        let response = client.call(ApiRequest::get(paths::ME)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(backend.count(HttpMethod::Post, paths::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed_and_replayed() {
        let (backend, client) = client().await;
        let mut events = client.subscribe();
        backend.expire_session();

        let response = client.call(ApiRequest::get(paths::ME)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(backend.count(HttpMethod::Post, paths::REFRESH), 1);
        assert_eq!(backend.count(HttpMethod::Get, paths::ME), 2);
        assert_eq!(events.try_recv().unwrap(), AuthEvent::Refreshed);
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_forbidden_also_triggers_refresh() {
        let (backend, client) = client().await;
        backend.fail_next(HttpMethod::Get, paths::COMPLAINTS, 403);

        let response = client.call(ApiRequest::get(paths::COMPLAINTS)).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(backend.count(HttpMethod::Post, paths::REFRESH), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_auth_expired() {
        let (backend, client) = client().await;
        let mut events = client.subscribe();
        backend.revoke_refresh();

        let result = client.call(ApiRequest::get(paths::ME)).await;

        assert!(matches!(result, Err(PortalError::AuthExpired(_))));
        assert_eq!(events.try_recv().unwrap(), AuthEvent::Expired);
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_not_found_is_not_intercepted() {
        let (backend, client) = client().await;
        let result = client.call(ApiRequest::get(paths::complaint("missing"))).await;

        assert!(matches!(result, Err(PortalError::NotFound(_))));
        assert_eq!(backend.count(HttpMethod::Post, paths::REFRESH), 0);
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_waiters() {
        let (_backend, client) = client().await;

        assert!(matches!(lock(&client.refresh).join(0), Ticket::Leader));
        let episode = Episode {
            state: &client.refresh,
            settled: false,
        };
        let waiter = lock(&client.refresh).join(0);
        assert_eq!(client.pending_count(), 1);

        // Future лидера уничтожен до завершения refresh
        drop(episode);

        assert!(matches!(waiter.outcome().await, Err(PortalError::AuthExpired(_))));
        assert!(!client.is_refreshing());
    }
}
