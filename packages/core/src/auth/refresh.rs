// Состояние refresh сессии и очередь запросов, ожидающих его окончания

use crate::utils::error::{PortalError, Result};
use tokio::sync::oneshot;

type Waiter = oneshot::Sender<Result<()>>;

/// Запросы, получившие 401/403 во время уже идущего refresh.
///
/// Каждый элемент — продолжение запроса: после refresh его будят одним и
/// тем же исходом, и запрос сам повторяет себя.
#[derive(Debug, Default)]
pub struct PendingRequestQueue {
    waiters: Vec<Waiter>,
}

impl PendingRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Встать в очередь; receiver получит исход refresh
    pub fn enqueue(&mut self) -> oneshot::Receiver<Result<()>> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Разбудить всех в порядке постановки; возвращает число разбуженных
    pub fn settle(self, outcome: &Result<()>) -> usize {
        let count = self.waiters.len();
        for waiter in self.waiters {
            // Получатель мог уйти (запрос отменён) — это не ошибка
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Refreshing(PendingRequestQueue),
}

/// Состояние координации refresh.
///
/// В фазе refresh ровно один запрос (лидер) выполняет refresh, остальные
/// ждут в очереди. Второго refresh в полёте быть не может.
///
/// `epoch` растёт с каждым успешным refresh. Запрос запоминает эпоху до
/// отправки: если 401/403 пришёл, когда эпоха уже сменилась, сессия обновлена
/// без него и новый эпизод не нужен.
#[derive(Debug, Default)]
pub struct RefreshState {
    phase: Phase,
    epoch: u64,
}

/// Роль запроса в эпизоде refresh
#[derive(Debug)]
pub enum Ticket {
    /// Этот запрос выполняет refresh
    Leader,
    /// Refresh уже идёт, ждём исход
    Waiter(oneshot::Receiver<Result<()>>),
    /// Сессия обновлена после отправки запроса: сразу повторить
    Renewed,
}

impl RefreshState {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.phase, Phase::Refreshing(_))
    }

    pub fn pending(&self) -> usize {
        match &self.phase {
            Phase::Idle => 0,
            Phase::Refreshing(queue) => queue.len(),
        }
    }

    /// Присоединиться к эпизоду. `sent_in` — эпоха на момент отправки запроса.
    ///
    /// Первый в эпохе становится лидером, остальные ждут; запрос из прошлой
    /// эпохи получает `Renewed`.
    pub fn join(&mut self, sent_in: u64) -> Ticket {
        if sent_in != self.epoch {
            return Ticket::Renewed;
        }
        if let Phase::Refreshing(queue) = &mut self.phase {
            return Ticket::Waiter(queue.enqueue());
        }
        self.phase = Phase::Refreshing(PendingRequestQueue::new());
        Ticket::Leader
    }

    /// Закрыть эпизод: фаза `Idle`, все ожидающие получают один и тот же исход
    pub fn settle(&mut self, outcome: &Result<()>) -> usize {
        match std::mem::take(&mut self.phase) {
            Phase::Idle => 0,
            Phase::Refreshing(queue) => {
                if outcome.is_ok() {
                    self.epoch += 1;
                }
                queue.settle(outcome)
            }
        }
    }
}

impl Ticket {
    /// Дождаться исхода (у лидера исход свой)
    pub async fn outcome(self) -> Result<()> {
        match self {
            Ticket::Leader | Ticket::Renewed => Ok(()),
            Ticket::Waiter(rx) => rx.await.unwrap_or_else(|_| {
                Err(PortalError::AuthExpired("session refresh was abandoned".to_string()))
            }),
        }
    }
}
