// In-memory бэкенд портала для тестов и offline демо
//
// Ведёт себя как REST бэкенд за cookie-сессией: access cookie может протухнуть,
// `/auth/refresh` выдаёт новую, пока жива refresh cookie. Каждый вход и каждый
// refresh увеличивают поколение сессии, и журнал запросов его запоминает.

use crate::models::{
    Activity, Application, ApplicationStatus, Comment, Complaint, ComplaintCategory,
    ComplaintPriority, ComplaintStatus, Kyc, KycStatus, Media, Pg, StayRecord, Tenant,
};
use crate::protocol::messages::{
    fields, ApplicationData, LoginData, MeResponse, PasswordUpdate, ProfileUpdate, RegisterData,
};
use crate::protocol::transport::HttpTransport;
use crate::protocol::wire::{ApiRequest, ApiResponse, HttpMethod, MediaFile, MultipartForm, RequestBody};
use crate::utils::error::{PortalError, Result};
use crate::utils::uuid::generate_v4;
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Запись журнала запросов
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: HttpMethod,
    pub path: String,
    /// Поколение сессии в момент получения запроса
    pub generation: u64,
    /// Запрос был повтором после refresh
    pub retried: bool,
    /// `None` — запрос не дошёл (бэкенд offline)
    pub status: Option<u16>,
}

struct Account {
    tenant: Tenant,
    password: String,
}

struct BrowserSession {
    tenant_id: String,
    access_valid: bool,
    refresh_valid: bool,
}

struct ScriptedFailure {
    method: HttpMethod,
    path: String,
    status: u16,
}

#[derive(Default)]
struct BackendState {
    accounts: Vec<Account>,
    session: Option<BrowserSession>,
    generation: u64,
    stays: HashMap<String, StayRecord>,
    complaints: Vec<Complaint>,
    pgs: Vec<Pg>,
    applications: Vec<(String, Application)>,
    scripted: Vec<ScriptedFailure>,
    offline: bool,
    log: Vec<RequestRecord>,
}

// Ok и Err оба несут готовый HTTP ответ; Err позволяет выходить через `?`
type Reply = std::result::Result<ApiResponse, ApiResponse>;

/// In-memory бэкенд
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<BackendState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Наполнение ===

    /// Завести аккаунт арендатора
    pub fn seed_account(&self, full_name: &str, email: &str, password: &str) -> Tenant {
        let tenant = Tenant {
            id: generate_v4(),
            full_name: full_name.to_string(),
            email: Some(email.to_string()),
            phone: None,
            date_of_birth: None,
            gender: None,
            profile_image: None,
            kycs: Vec::new(),
            created_at: Some(Utc::now().to_rfc3339()),
        };
        self.lock().accounts.push(Account {
            tenant: tenant.clone(),
            password: password.to_string(),
        });
        tenant
    }

    /// Активное проживание арендатора
    pub fn seed_stay(&self, stay: StayRecord) {
        self.lock().stays.insert(stay.tenant_id.clone(), stay);
    }

    pub fn seed_pg(&self, pg: Pg) {
        self.lock().pgs.push(pg);
    }

    // === Управление сессией ===

    /// Access cookie протухла (следующий защищённый запрос получит 401)
    pub fn expire_session(&self) {
        if let Some(session) = self.lock().session.as_mut() {
            session.access_valid = false;
        }
    }

    /// Протухли обе cookie: refresh вернёт 401
    pub fn revoke_refresh(&self) {
        if let Some(session) = self.lock().session.as_mut() {
            session.access_valid = false;
            session.refresh_valid = false;
        }
    }

    pub fn has_session(&self) -> bool {
        self.lock().session.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    // === Серверные переходы и сбои ===

    /// Сменить статус жалобы так, как это делает владелец/админ
    pub fn set_complaint_status(&self, complaint_id: &str, status: ComplaintStatus) -> bool {
        let mut state = self.lock();
        let Some(complaint) = state.complaints.iter_mut().find(|c| c.id == complaint_id) else {
            return false;
        };
        complaint.status = status;
        complaint.updated_at = Some(Utc::now());
        if status == ComplaintStatus::Resolved {
            complaint.resolved_at = complaint.updated_at;
        }
        complaint
            .activities
            .push(activity(&format!("Status changed to {}", status)));
        true
    }

    /// Следующий запрос `method path` получит `status` вместо обычного ответа
    pub fn fail_next(&self, method: HttpMethod, path: &str, status: u16) {
        self.lock().scripted.push(ScriptedFailure {
            method,
            path: path.trim_end_matches('/').to_string(),
            status,
        });
    }

    /// Offline: все запросы завершаются транспортной ошибкой
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    // === Журнал ===

    pub fn requests(&self) -> Vec<RequestRecord> {
        self.lock().log.clone()
    }

    /// Сколько раз приходил запрос `method path`
    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for MemoryBackend {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        // Отдаём управление как настоящий сетевой вызов
        tokio::task::yield_now().await;

        let mut state = self.lock();
        let mut record = RequestRecord {
            method: request.method,
            path: request.route().to_string(),
            generation: state.generation,
            retried: request.is_retry(),
            status: None,
        };

        if state.offline {
            state.log.push(record);
            return Err(PortalError::NetworkError("backend is unreachable".to_string()));
        }

        let response = match state.take_scripted(request) {
            Some(status) => message(status, "Scripted failure"),
            None => match state.handle(request) {
                Ok(response) | Err(response) => response,
            },
        };

        trace!(method = %record.method, path = %record.path, status = response.status, "memory backend");
        record.status = Some(response.status);
        state.log.push(record);
        Ok(response)
    }
}

impl BackendState {
    fn take_scripted(&mut self, request: &ApiRequest) -> Option<u16> {
        let idx = self
            .scripted
            .iter()
            .position(|f| f.method == request.method && f.path == request.route())?;
        Some(self.scripted.remove(idx).status)
    }

    fn handle(&mut self, request: &ApiRequest) -> Reply {
        use HttpMethod::{Delete, Get, Patch, Post};

        let segments: Vec<&str> = request.route().trim_start_matches('/').split('/').collect();
        match (request.method, segments.as_slice()) {
            (Post, ["auth", "login"]) => self.login(request),
            (Post, ["auth", "logout"]) => self.logout(),
            (Post, ["auth", "refresh"]) => self.refresh(),
            (Post, ["auth", "register"]) => self.register(request),
            (Get, ["auth", "me"]) => self.me(),

            (Patch, ["tenants", "me"]) => self.update_profile(request),
            (Delete, ["tenants", "me"]) => self.delete_account(),
            (Patch, ["tenants", "me", "password"]) => self.update_password(request),
            (Patch, ["tenants", "me", "profile-image"]) => self.upload_profile_image(request),
            (Post, ["tenants", "kyc"]) => self.create_kyc(request),
            (Patch, ["tenants", "kyc", id]) => self.update_kyc(id, request),
            (Delete, ["tenants", "kyc", id]) => self.delete_kyc(id),

            (Get, ["complaints"]) => self.list_complaints(),
            (Post, ["complaints"]) => self.create_complaint(request),
            (Get, ["complaints", id]) => self.get_complaint(id),
            (Post, ["complaints", id, "comments"]) => self.add_comment(id, request),
            (Patch, ["complaints", id, "reopen"]) => self.reopen_complaint(id),

            (Get, ["pg", code]) => self.find_pg(code),
            (Get, ["applications"]) => self.list_applications(),
            (Post, ["applications"]) => self.submit_application(request),

            _ => Err(message(404, "Route not found")),
        }
    }

    fn authorize(&self) -> std::result::Result<String, ApiResponse> {
        match &self.session {
            Some(session) if session.access_valid => Ok(session.tenant_id.clone()),
            _ => Err(message(401, "Unauthorized")),
        }
    }

    fn account_mut(&mut self, tenant_id: &str) -> std::result::Result<&mut Account, ApiResponse> {
        self.accounts
            .iter_mut()
            .find(|a| a.tenant.id == tenant_id)
            .ok_or_else(|| message(401, "Unauthorized"))
    }

    fn complaint_mut(
        &mut self,
        tenant_id: &str,
        id: &str,
    ) -> std::result::Result<&mut Complaint, ApiResponse> {
        self.complaints
            .iter_mut()
            .find(|c| c.id == id && c.tenant_id.as_deref() == Some(tenant_id))
            .ok_or_else(|| message(404, "Complaint not found"))
    }

    // === Auth ===

    fn login(&mut self, request: &ApiRequest) -> Reply {
        let data: LoginData = parse_json(request)?;
        let account = self
            .accounts
            .iter()
            .find(|a| {
                let id = data.identifier.as_str();
                a.tenant.email.as_deref() == Some(id) || a.tenant.phone.as_deref() == Some(id)
            })
            .filter(|a| a.password == data.password)
            .ok_or_else(|| message(401, "Invalid credentials"))?;

        self.session = Some(BrowserSession {
            tenant_id: account.tenant.id.clone(),
            access_valid: true,
            refresh_valid: true,
        });
        self.generation += 1;
        Ok(message(200, "Login successful"))
    }

    fn logout(&mut self) -> Reply {
        self.session = None;
        Ok(message(200, "Logged out"))
    }

    fn refresh(&mut self) -> Reply {
        match self.session.as_mut() {
            Some(session) if session.refresh_valid => {
                session.access_valid = true;
                self.generation += 1;
                Ok(message(200, "Session refreshed"))
            }
            _ => Err(message(401, "Refresh token expired")),
        }
    }

    fn register(&mut self, request: &ApiRequest) -> Reply {
        let data: RegisterData = parse_json(request)?;
        if data.full_name.trim().is_empty() || data.password.is_empty() {
            return Err(message(400, "Please fill required fields"));
        }

        let email = Some(data.email.trim()).filter(|s| !s.is_empty());
        let phone = Some(data.phone.trim()).filter(|s| !s.is_empty());
        let taken = self.accounts.iter().any(|a| {
            (email.is_some() && a.tenant.email.as_deref() == email)
                || (phone.is_some() && a.tenant.phone.as_deref() == phone)
        });
        if taken {
            return Err(message(409, "Account already exists"));
        }

        self.accounts.push(Account {
            tenant: Tenant {
                id: generate_v4(),
                full_name: data.full_name.trim().to_string(),
                email: email.map(str::to_string),
                phone: phone.map(str::to_string),
                date_of_birth: None,
                gender: None,
                profile_image: None,
                kycs: Vec::new(),
                created_at: Some(Utc::now().to_rfc3339()),
            },
            password: data.password,
        });
        Ok(message(201, "Registered"))
    }

    fn me(&mut self) -> Reply {
        let tenant_id = self.authorize()?;
        let tenant = self.account_mut(&tenant_id)?.tenant.clone();
        let me = MeResponse {
            tenant,
            stay: self.stays.get(&tenant_id).cloned(),
        };
        bare(200, &me)
    }

    // === Профиль ===

    fn update_profile(&mut self, request: &ApiRequest) -> Reply {
        let tenant_id = self.authorize()?;
        let update: ProfileUpdate = parse_json(request)?;
        let tenant = &mut self.account_mut(&tenant_id)?.tenant;

        if let Some(full_name) = update.full_name {
            tenant.full_name = full_name;
        }
        if update.email.is_some() {
            tenant.email = update.email;
        }
        if update.phone.is_some() {
            tenant.phone = update.phone;
        }
        if update.date_of_birth.is_some() {
            tenant.date_of_birth = update.date_of_birth;
        }
        if update.gender.is_some() {
            tenant.gender = update.gender;
        }
        with_data(200, &*tenant)
    }

    fn update_password(&mut self, request: &ApiRequest) -> Reply {
        let tenant_id = self.authorize()?;
        let update: PasswordUpdate = parse_json(request)?;
        let account = self.account_mut(&tenant_id)?;
        if account.password != update.current_pass {
            return Err(message(400, "Current password is incorrect"));
        }
        account.password = update.new_pass;
        Ok(message(200, "Password updated"))
    }

    fn upload_profile_image(&mut self, request: &ApiRequest) -> Reply {
        let tenant_id = self.authorize()?;
        let form = parse_form(request)?;
        let file = form
            .files_named(fields::PROFILE_IMAGE)
            .next()
            .ok_or_else(|| message(400, "Profile image is required"))?;
        let url = stored_url(file);

        let tenant = &mut self.account_mut(&tenant_id)?.tenant;
        tenant.profile_image = Some(url);
        with_data(200, &*tenant)
    }

    fn delete_account(&mut self) -> Reply {
        let tenant_id = self.authorize()?;
        self.accounts.retain(|a| a.tenant.id != tenant_id);
        self.stays.remove(&tenant_id);
        self.session = None;
        Ok(message(200, "Account deleted"))
    }

    fn create_kyc(&mut self, request: &ApiRequest) -> Reply {
        let tenant_id = self.authorize()?;
        let form = parse_form(request)?;
        let document_type = form
            .text_value(fields::DOCUMENT_TYPE)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| message(400, "Document type is required"))?;
        let file = form
            .files_named(fields::DOCUMENT_FILE)
            .next()
            .ok_or_else(|| message(400, "Document file is required"))?;

        let kyc = Kyc {
            id: generate_v4(),
            document_type: document_type.to_string(),
            document_no: form.text_value(fields::DOCUMENT_NO).map(str::to_string),
            document_url: stored_url(file),
            status: KycStatus::Submitted,
            rejection_reason: None,
        };
        self.account_mut(&tenant_id)?.tenant.kycs.push(kyc.clone());
        with_data(201, &kyc)
    }

    fn update_kyc(&mut self, id: &str, request: &ApiRequest) -> Reply {
        let tenant_id = self.authorize()?;
        let form = parse_form(request)?;
        let kyc = self
            .account_mut(&tenant_id)?
            .tenant
            .kycs
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| message(404, "KYC document not found"))?;

        if let Some(document_type) = form.text_value(fields::DOCUMENT_TYPE).filter(|s| !s.is_empty()) {
            kyc.document_type = document_type.to_string();
        }
        if let Some(document_no) = form.text_value(fields::DOCUMENT_NO) {
            kyc.document_no = Some(document_no.to_string());
        }
        if let Some(file) = form.files_named(fields::DOCUMENT_FILE).next() {
            kyc.document_url = stored_url(file);
        }
        kyc.status = KycStatus::Submitted;
        kyc.rejection_reason = None;
        with_data(200, &*kyc)
    }

    fn delete_kyc(&mut self, id: &str) -> Reply {
        let tenant_id = self.authorize()?;
        let kycs = &mut self.account_mut(&tenant_id)?.tenant.kycs;
        let before = kycs.len();
        kycs.retain(|k| k.id != id);
        if kycs.len() == before {
            return Err(message(404, "KYC document not found"));
        }
        Ok(message(200, "KYC document deleted"))
    }

    // === Жалобы ===

    fn list_complaints(&mut self) -> Reply {
        let tenant_id = self.authorize()?;
        let list: Vec<&Complaint> = self
            .complaints
            .iter()
            .filter(|c| c.tenant_id.as_deref() == Some(tenant_id.as_str()))
            .collect();
        with_data(200, &list)
    }

    fn create_complaint(&mut self, request: &ApiRequest) -> Reply {
        let tenant_id = self.authorize()?;
        let form = parse_form(request)?;

        let title = form.text_value(fields::TITLE).unwrap_or_default().trim();
        let description = form.text_value(fields::DESCRIPTION).unwrap_or_default().trim();
        if title.is_empty() || description.is_empty() {
            return Err(message(400, "Title and Description are required"));
        }

        let category: ComplaintCategory = parse_enum(form.text_value(fields::CATEGORY))?;
        let priority: ComplaintPriority = parse_enum(form.text_value(fields::PRIORITY))?;
        let pg_id = form
            .text_value(fields::PG_ID)
            .map(str::to_string)
            .or_else(|| self.stays.get(&tenant_id).map(|s| s.pg_id.clone()));

        let complaint = Complaint {
            id: generate_v4(),
            title: title.to_string(),
            description: description.to_string(),
            status: ComplaintStatus::Open,
            priority,
            category,
            created_at: Utc::now(),
            updated_at: None,
            resolved_at: None,
            tenant_id: Some(tenant_id),
            pg_id,
            media: form.files_named(fields::MEDIA).map(to_media).collect(),
            comments: Vec::new(),
            activities: vec![activity("Complaint created")],
        };
        self.complaints.push(complaint.clone());
        with_data(201, &complaint)
    }

    fn get_complaint(&mut self, id: &str) -> Reply {
        let tenant_id = self.authorize()?;
        let complaint = self.complaint_mut(&tenant_id, id)?;
        bare(200, &*complaint)
    }

    fn add_comment(&mut self, id: &str, request: &ApiRequest) -> Reply {
        let tenant_id = self.authorize()?;
        let form = parse_form(request)?;
        let text = form.text_value(fields::MESSAGE).unwrap_or_default().trim();
        let media: Vec<Media> = form.files_named(fields::MEDIA).map(to_media).collect();
        if text.is_empty() && media.is_empty() {
            return Err(message(400, "Comment cannot be empty"));
        }

        let comment = Comment {
            id: generate_v4(),
            message: text.to_string(),
            media,
            created_at: Utc::now(),
            author_type: Some("TENANT".to_string()),
        };
        let complaint = self.complaint_mut(&tenant_id, id)?;
        complaint.comments.push(comment.clone());
        complaint.updated_at = Some(comment.created_at);
        with_data(201, &comment)
    }

    fn reopen_complaint(&mut self, id: &str) -> Reply {
        let tenant_id = self.authorize()?;
        let complaint = self.complaint_mut(&tenant_id, id)?;
        let status = complaint
            .status
            .reopen()
            .map_err(|_| message(400, "Only resolved or closed complaints can be reopened"))?;

        complaint.status = status;
        complaint.resolved_at = None;
        complaint.updated_at = Some(Utc::now());
        complaint.activities.push(activity("Complaint reopened by tenant"));
        with_data(200, &*complaint)
    }

    // === PG и заявки ===

    fn find_pg(&mut self, code: &str) -> Reply {
        self.authorize()?;
        let pg = self
            .pgs
            .iter()
            .find(|p| p.pg_code == code)
            .ok_or_else(|| message(404, "PG not found"))?;
        with_data(200, pg)
    }

    fn list_applications(&mut self) -> Reply {
        let tenant_id = self.authorize()?;
        let list: Vec<&Application> = self
            .applications
            .iter()
            .filter(|(owner, _)| *owner == tenant_id)
            .map(|(_, application)| application)
            .collect();
        with_data(200, &list)
    }

    fn submit_application(&mut self, request: &ApiRequest) -> Reply {
        let tenant_id = self.authorize()?;
        let data: ApplicationData = parse_json(request)?;
        let pg = self
            .pgs
            .iter()
            .find(|p| p.id == data.pg_id)
            .cloned()
            .ok_or_else(|| message(404, "PG not found"))?;

        let duplicate = self.applications.iter().any(|(owner, a)| {
            *owner == tenant_id && a.pg.id == pg.id && a.status == ApplicationStatus::Pending
        });
        if duplicate {
            return Err(message(409, "Application already submitted"));
        }

        let application = Application {
            id: generate_v4(),
            status: ApplicationStatus::Pending,
            message: Some(data.message).filter(|m| !m.trim().is_empty()),
            created_at: Utc::now(),
            pg,
        };
        self.applications.push((tenant_id, application.clone()));
        with_data(201, &application)
    }
}

// === Хелперы ответов ===

fn message(status: u16, text: &str) -> ApiResponse {
    ApiResponse::json_body(status, &json!({ "message": text }))
}

fn bare<T: Serialize + ?Sized>(status: u16, value: &T) -> Reply {
    let value = serde_json::to_value(value).map_err(|e| message(500, &e.to_string()))?;
    Ok(ApiResponse::json_body(status, &value))
}

fn with_data<T: Serialize + ?Sized>(status: u16, value: &T) -> Reply {
    let value = serde_json::to_value(value).map_err(|e| message(500, &e.to_string()))?;
    Ok(ApiResponse::json_body(status, &json!({ "data": value })))
}

fn parse_json<T: DeserializeOwned>(request: &ApiRequest) -> std::result::Result<T, ApiResponse> {
    match &request.body {
        RequestBody::Json(value) => serde_json::from_value(value.clone())
            .map_err(|e| message(400, &format!("Invalid request body: {}", e))),
        _ => Err(message(400, "JSON body expected")),
    }
}

fn parse_form(request: &ApiRequest) -> std::result::Result<&MultipartForm, ApiResponse> {
    match &request.body {
        RequestBody::Multipart(form) => Ok(form),
        _ => Err(message(400, "Multipart body expected")),
    }
}

// Значение enum из текстового поля формы; отсутствие → значение по умолчанию
fn parse_enum<T: DeserializeOwned + Default>(raw: Option<&str>) -> std::result::Result<T, ApiResponse> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(T::default()),
        Some(value) => serde_json::from_value(json!(value))
            .map_err(|_| message(400, &format!("Unknown value: {}", value))),
    }
}

fn stored_url(file: &MediaFile) -> String {
    format!("memory://media/{}/{}", generate_v4(), file.file_name)
}

fn to_media(file: &MediaFile) -> Media {
    let file_type = if file.content_type.starts_with("image/") {
        "IMAGE"
    } else if file.content_type.starts_with("video/") {
        "VIDEO"
    } else {
        "FILE"
    };
    Media {
        id: generate_v4(),
        file_url: stored_url(file),
        file_type: file_type.to_string(),
    }
}

fn activity(action: &str) -> Activity {
    Activity {
        id: generate_v4(),
        action: action.to_string(),
        created_at: Utc::now(),
    }
}
