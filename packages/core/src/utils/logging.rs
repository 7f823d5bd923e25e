// Логирование
//
// Весь крейт пишет через `tracing`. Подписчика ставит приложение-оболочка;
// `init_logging` — готовый вариант для CLI, демо и тестов.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Установить fmt-подписчик с фильтром из `RUST_LOG` (по умолчанию `info`).
///
/// Повторные вызовы ничего не делают.
pub fn init_logging() {
    LOGGING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
        tracing::debug!("millionhuts-core logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        assert!(LOGGING_INIT.get().is_some());
    }
}
