//! Слой авторизованного доступа
//!
//! Все защищённые вызовы идут через [`AuthenticatedClient::call`]:
//!
//! ```text
//!  call ──► transport ──► 2xx/4xx/5xx ───────────────────────────────► результат
//!                │
//!                └─► 401/403 (не refresh, не повтор)
//!                        │
//!              эпоха сменилась ──► сразу повторить (refresh уже прошёл)
//!              Idle ──► лидер: POST /auth/refresh
//!                        │                  ├─ ok  ─► settle(Ok), epoch+1 ─► все повторяют запрос
//!                        │                  └─ err ─► settle(Err) ─► все получают AuthExpired
//!              Refreshing ──► встать в PendingRequestQueue и ждать
//! ```
//!
//! Повторённый запрос, снова получивший 401/403, завершается `AuthExpired`
//! без нового refresh.

pub mod access;
pub mod refresh;

pub use access::{AuthEvent, AuthenticatedClient};
pub use refresh::{PendingRequestQueue, RefreshState, Ticket};
