// Клиентское состояние портала

pub mod session;

pub use session::{SessionManager, SessionSnapshot};
