mod auth;
mod health_check;

pub use auth::login;
pub use auth::logout;
pub use auth::refresh;
pub use auth::request_password_reset;
pub use auth::reset_password;
pub use auth::session_info;
pub use health_check::health_check;
