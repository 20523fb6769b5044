mod manager;
mod requests;

pub use manager::{PlatformError, PlatformManager};
pub use requests::{
    AdminRegistrationRequest, AuthenticatedUser, ContactRequest, DashboardStats, LoginRequest,
    MessageStats, ReadUpdate, RegisterRequest, RegistrationStats, SeatCount, SettingsUpdate,
    StatusUpdate, VideoPreview, VideoRequest, VideoStats,
};
