pub mod announcements;
pub mod attendance;
pub mod leave;
pub mod profile;
pub mod users;
