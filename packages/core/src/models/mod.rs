// Доменные модели портала (формат соответствует JSON бэкенда, camelCase)

pub mod complaint;
pub mod pg;
pub mod tenant;

pub use complaint::{
    Activity, Comment, Complaint, ComplaintCategory, ComplaintPriority, ComplaintStatus, Media,
};
pub use pg::{Application, ApplicationStatus, CoverImage, Pg, PgDetails};
pub use tenant::{Gender, Kyc, KycStatus, StayRecord, StayStatus, Tenant};
