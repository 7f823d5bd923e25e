// Вспомогательные модули: ошибки, логирование, идентификаторы

pub mod error;
pub mod logging;
pub mod uuid;
