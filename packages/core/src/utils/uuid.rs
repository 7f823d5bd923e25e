// UUID утилиты

use ::uuid::Uuid;

/// Новый v4 идентификатор в строковом виде
pub fn generate_v4() -> String {
    Uuid::new_v4().to_string()
}

/// Идентификатор запроса для корреляции логов (`x-request-id`)
pub fn new_request_id() -> Uuid {
    Uuid::new_v4()
}
