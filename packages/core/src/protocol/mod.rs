// Протокол общения с REST бэкендом портала

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod messages;
pub mod transport;
pub mod validation;
pub mod wire;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryBackend, RequestRecord};
pub use transport::{HttpTransport, ReqwestTransport};
pub use wire::{ApiRequest, ApiResponse, HttpMethod, MediaFile, MultipartForm, RequestBody};

/// Пути эндпоинтов (относительно `Config::api_base_url`)
pub mod paths {
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    /// Эндпоинт refresh никогда не перехватывается слоем доступа
    pub const REFRESH: &str = "/auth/refresh";
    pub const ME: &str = "/auth/me";
    pub const REGISTER: &str = "/auth/register";

    pub const TENANT_ME: &str = "/tenants/me";
    pub const TENANT_PASSWORD: &str = "/tenants/me/password";
    pub const TENANT_PROFILE_IMAGE: &str = "/tenants/me/profile-image";
    pub const KYC: &str = "/tenants/kyc";

    pub const COMPLAINTS: &str = "/complaints";
    pub const APPLICATIONS: &str = "/applications";

    pub fn complaint(id: &str) -> String {
        format!("{}/{}", COMPLAINTS, id)
    }

    pub fn comments(complaint_id: &str) -> String {
        format!("{}/{}/comments", COMPLAINTS, complaint_id)
    }

    pub fn reopen(complaint_id: &str) -> String {
        format!("{}/{}/reopen", COMPLAINTS, complaint_id)
    }

    pub fn pg(code: &str) -> String {
        format!("/pg/{}", code)
    }

    pub fn kyc(id: &str) -> String {
        format!("{}/{}", KYC, id)
    }

    /// `route` — результат `ApiRequest::route()`; допускается путь без
    /// ведущего `/` и путь с префиксом базы (`/api/auth/refresh`)
    pub fn is_refresh(route: &str) -> bool {
        route.trim_start_matches('/') == REFRESH.trim_start_matches('/') || route.ends_with(REFRESH)
    }
}
