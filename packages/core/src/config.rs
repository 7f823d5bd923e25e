//! Централизованная конфигурация для MillionHuts Portal Core
//!
//! Все константы и настройки клиента должны быть определены здесь,
//! чтобы избежать хардкода по всему проекту.

use std::sync::OnceLock;

/// Глобальная конфигурация клиента (синглтон)
static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Основная структура конфигурации
#[derive(Debug, Clone)]
pub struct Config {
    // ============================================
    // СЕТЕВЫЕ ПАРАМЕТРЫ
    // ============================================

    /// Базовый URL REST бэкенда (все пути эндпоинтов относительны ему)
    pub api_base_url: String,

    /// Таймаут одного HTTP запроса (в миллисекундах)
    /// По умолчанию: 10 секунд
    pub request_timeout_ms: u64,

    /// Отправлять ли cookie сессии вместе с запросами (аналог `withCredentials`)
    pub with_credentials: bool,

    /// User-Agent для всех запросов
    pub user_agent: String,

    // ============================================
    // СЕССИЯ
    // ============================================

    /// Размер буфера broadcast-канала событий сессии (Refreshed / Expired)
    pub auth_event_capacity: usize,

    // ============================================
    // ВАЛИДАЦИЯ
    // ============================================

    /// Минимальная длина пароля
    pub password_min_length: usize,
}

impl Config {
    /// Создать конфигурацию с дефолтными значениями
    pub fn default() -> Self {
        Self {
            // Сеть
            api_base_url: "http://localhost:8080/api".to_string(),
            request_timeout_ms: 10_000,
            with_credentials: true,
            user_agent: format!("millionhuts-core/{}", env!("CARGO_PKG_VERSION")),

            // Сессия
            auth_event_capacity: 16,

            // Валидация
            password_min_length: 6,
        }
    }

    /// Создать конфигурацию из переменных окружения
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Переопределяем значения из env, если они заданы
        if let Ok(val) = std::env::var("PORTAL_API_URL") {
            if !val.trim().is_empty() {
                config.api_base_url = val.trim().to_string();
            }
        }

        if let Ok(val) = std::env::var("PORTAL_REQUEST_TIMEOUT_MS") {
            if let Ok(parsed) = val.parse() {
                config.request_timeout_ms = parsed;
            }
        }

        if let Ok(val) = std::env::var("PORTAL_WITH_CREDENTIALS") {
            if let Ok(parsed) = val.parse() {
                config.with_credentials = parsed;
            }
        }

        config
    }

    /// Получить глобальный экземпляр конфигурации
    ///
    /// Автоматически инициализирует конфигурацию со значениями по умолчанию при первом вызове
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Инициализировать глобальную конфигурацию со значениями по умолчанию
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init() -> Result<(), &'static str> {
        GLOBAL_CONFIG.set(Self::default())
            .map_err(|_| "Config already initialized")
    }

    /// Инициализировать глобальную конфигурацию из переменных окружения
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_from_env() -> Result<(), &'static str> {
        GLOBAL_CONFIG.set(Self::from_env())
            .map_err(|_| "Config already initialized")
    }

    /// Инициализировать глобальную конфигурацию с кастомным экземпляром
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_with(config: Config) -> Result<(), &'static str> {
        GLOBAL_CONFIG.set(config)
            .map_err(|_| "Config already initialized")
    }

    /// Проверить, инициализирована ли глобальная конфигурация
    pub fn is_initialized() -> bool {
        GLOBAL_CONFIG.get().is_some()
    }

    /// Таймаут запроса как `Duration`
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.password_min_length, 6);
        assert!(config.with_credentials);
    }

    #[test]
    fn test_config_values() {
        let config = Config::default();

        // Network
        assert!(config.api_base_url.starts_with("http://"));
        assert!(config.user_agent.starts_with("millionhuts-core/"));
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(10));

        // Session
        assert_eq!(config.auth_event_capacity, 16);
    }

    #[test]
    fn test_global_config_is_initialized_lazily() {
        let cfg = Config::global();
        assert!(Config::is_initialized());
        assert_eq!(cfg.password_min_length, Config::global().password_min_length);
        assert!(Config::init().is_err());
    }
}
