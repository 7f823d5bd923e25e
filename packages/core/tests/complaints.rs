//! Complaint lifecycle tests against the in-memory backend

use millionhuts_core::models::{ComplaintCategory, ComplaintPriority, ComplaintStatus};
use millionhuts_core::protocol::{paths, HttpMethod, MemoryBackend};
use millionhuts_core::{Config, MediaFile, NewComplaint, PortalAPI, PortalError};
use std::sync::Arc;

type Portal = PortalAPI<Arc<MemoryBackend>>;

async fn signed_in() -> (Arc<MemoryBackend>, Portal) {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_account("Asha Rao", "asha@example.com", "secret123");
    let portal = PortalAPI::new(backend.clone(), &Config::default());
    portal.session().login("asha@example.com", "secret123").await.unwrap();
    (backend, portal)
}

fn photo(name: &str) -> MediaFile {
    MediaFile::new(name, "image/jpeg", vec![0xff, 0xd8, 0xff])
}

#[tokio::test]
async fn test_create_requires_title_and_description() {
    let (backend, portal) = signed_in().await;
    let before = backend.requests().len();

    for draft in [
        NewComplaint::new("", "Water leaking"),
        NewComplaint::new("Leak", "   "),
        NewComplaint::new("  ", ""),
    ] {
        let result = portal.complaints().create(draft).await;
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
    }

    assert_eq!(backend.requests().len(), before, "validation must not hit the network");
}

#[tokio::test]
async fn test_create_defaults_survive_round_trip() {
    let (_backend, portal) = signed_in().await;

    let created = portal
        .complaints()
        .create(NewComplaint::new("WiFi down", "No internet since morning"))
        .await
        .unwrap();
    assert_eq!(created.status, ComplaintStatus::Open);

    let fetched = portal.complaints().get_details(&created.id).await.unwrap();
    assert_eq!(fetched.category, ComplaintCategory::Other);
    assert_eq!(fetched.priority, ComplaintPriority::Medium);
    assert_eq!(fetched.title, "WiFi down");
    assert!(!fetched.activities.is_empty());
}

#[tokio::test]
async fn test_create_with_media_sends_one_request() {
    let (backend, portal) = signed_in().await;

    let created = portal
        .complaints()
        .create(
            NewComplaint::new("Leaking tap", "Bathroom tap drips")
                .category(ComplaintCategory::Plumbing)
                .priority(ComplaintPriority::High)
                .attach(photo("tap1.jpg"))
                .attach(photo("tap2.jpg"))
                .attach(MediaFile::new("tap.mp4", "video/mp4", vec![0, 0, 0, 24])),
        )
        .await
        .unwrap();

    assert_eq!(created.category, ComplaintCategory::Plumbing);
    assert_eq!(created.priority, ComplaintPriority::High);
    assert_eq!(created.media.len(), 3);
    assert_eq!(created.media[2].file_type, "VIDEO");
    assert_eq!(backend.count(HttpMethod::Post, paths::COMPLAINTS), 1);
}

#[tokio::test]
async fn test_list_filters_by_title() {
    let (_backend, portal) = signed_in().await;
    let complaints = portal.complaints();
    complaints.create(NewComplaint::new("WiFi down", "d")).await.unwrap();
    complaints.create(NewComplaint::new("Leaking tap", "d")).await.unwrap();
    complaints.create(NewComplaint::new("Slow wifi in room 4", "d")).await.unwrap();

    assert_eq!(complaints.list_for_tenant(None).await.unwrap().len(), 3);
    assert_eq!(complaints.list_for_tenant(Some("  ")).await.unwrap().len(), 3);

    let wifi = complaints.list_for_tenant(Some("WIFI")).await.unwrap();
    assert_eq!(wifi.len(), 2);
    assert!(wifi.iter().all(|c| c.title.to_lowercase().contains("wifi")));
}

#[tokio::test]
async fn test_missing_complaint_is_not_found() {
    let (_backend, portal) = signed_in().await;
    let result = portal.complaints().get_details("does-not-exist").await;
    assert!(matches!(result, Err(PortalError::NotFound(_))));
}

#[tokio::test]
async fn test_empty_comment_is_rejected_without_network() {
    let (backend, portal) = signed_in().await;
    let created = portal
        .complaints()
        .create(NewComplaint::new("Fan broken", "Ceiling fan stopped"))
        .await
        .unwrap();
    let before = backend.requests().len();

    let result = portal.complaints().add_comment(&created.id, "  ", Vec::new()).await;

    assert!(matches!(result, Err(PortalError::ValidationError(_))));
    assert_eq!(backend.requests().len(), before);
}

#[tokio::test]
async fn test_comment_does_not_change_status() {
    let (_backend, portal) = signed_in().await;
    let complaints = portal.complaints();
    let created = complaints
        .create(NewComplaint::new("Fan broken", "Ceiling fan stopped"))
        .await
        .unwrap();

    let text = complaints
        .add_comment(&created.id, "Any update?", Vec::new())
        .await
        .unwrap();
    let media_only = complaints
        .add_comment(&created.id, "", vec![photo("fan.jpg")])
        .await
        .unwrap();

    assert_eq!(text.message, "Any update?");
    assert_eq!(media_only.media.len(), 1);
    assert_eq!(text.author_type.as_deref(), Some("TENANT"));

    let fetched = complaints.get_details(&created.id).await.unwrap();
    assert_eq!(fetched.status, ComplaintStatus::Open);
    assert_eq!(fetched.comments.len(), 2);
}

#[tokio::test]
async fn test_reopen_only_from_resolved_or_closed() {
    let (backend, portal) = signed_in().await;
    let complaints = portal.complaints();
    let created = complaints
        .create(NewComplaint::new("Fan broken", "Ceiling fan stopped"))
        .await
        .unwrap();
    let reopen_path = paths::reopen(&created.id);

    for status in [ComplaintStatus::Open, ComplaintStatus::InProgress] {
        backend.set_complaint_status(&created.id, status);
        let result = complaints.reopen(&created.id).await;
        assert!(matches!(result, Err(PortalError::InvalidTransition(_))));
    }
    assert_eq!(backend.count(HttpMethod::Patch, &reopen_path), 0);

    backend.set_complaint_status(&created.id, ComplaintStatus::Resolved);
    let reopened = complaints.reopen(&created.id).await.unwrap();
    assert_eq!(reopened.status, ComplaintStatus::Reopened);
    assert!(reopened.activities.iter().any(|a| a.action.contains("reopened")));

    // REOPENED нельзя открыть повторно, пока сервер снова не закроет жалобу
    let again = complaints.reopen(&created.id).await;
    assert!(matches!(again, Err(PortalError::InvalidTransition(_))));

    backend.set_complaint_status(&created.id, ComplaintStatus::Closed);
    assert_eq!(
        complaints.reopen(&created.id).await.unwrap().status,
        ComplaintStatus::Reopened
    );
    assert_eq!(backend.count(HttpMethod::Patch, &reopen_path), 2);
}

#[tokio::test]
async fn test_backend_rejection_of_reopen_surfaces_as_error() {
    let (backend, portal) = signed_in().await;
    let complaints = portal.complaints();
    let created = complaints
        .create(NewComplaint::new("Fan broken", "Ceiling fan stopped"))
        .await
        .unwrap();

    backend.set_complaint_status(&created.id, ComplaintStatus::Resolved);
    let stale = complaints.get_details(&created.id).await.unwrap();
    assert!(stale.can_reopen());

    // Сервер успел вернуть жалобу в работу
    backend.set_complaint_status(&created.id, ComplaintStatus::InProgress);
    let result = complaints.reopen_checked(&stale).await;

    assert!(matches!(result, Err(PortalError::Rejected(_))));
    let current = complaints.get_details(&created.id).await.unwrap();
    assert_eq!(current.status, ComplaintStatus::InProgress);
}

/// Mutations issued while the session is stale are replayed after one refresh
#[tokio::test]
async fn test_mutations_survive_session_expiry() {
    let (backend, portal) = signed_in().await;
    let complaints = portal.complaints();
    let created = complaints
        .create(NewComplaint::new("Fan broken", "Ceiling fan stopped"))
        .await
        .unwrap();

    backend.expire_session();
    let (comment, list) = tokio::join!(
        complaints.add_comment(&created.id, "still broken", vec![photo("fan.jpg")]),
        complaints.list_for_tenant(None),
    );

    assert_eq!(comment.unwrap().media.len(), 1);
    assert_eq!(list.unwrap().len(), 1);
    assert_eq!(backend.count(HttpMethod::Post, paths::REFRESH), 1);
    assert_eq!(complaints.get_details(&created.id).await.unwrap().comments.len(), 1);
}
