//! Repositories for database operations

pub mod menu;
pub mod organization;
pub mod tunkin;
pub mod user;

pub use menu::MenuRepository;
pub use organization::OrganizationRepository;
pub use tunkin::{TunkinFilter, TunkinRepository};
pub use user::UserRepository;
