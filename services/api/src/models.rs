//! API models for request and response payloads

pub mod organization;
pub mod token;
pub mod tunkin;
pub mod user;

// Re-export for convenience
pub use organization::{Organization, OrganizationRow};
pub use token::{
    AccessTokenResponse, RefreshTokenRequest, TokenPairResponse, TokenRequest, TokenValidation,
    ValidateTokenQuery,
};
pub use tunkin::{ExistResponse, SalaryKpiRecord, TunkinItem, TunkinQuery, TunkinRow, UploadResult};
pub use user::{UserProfile, UserRecord, UserRow};
