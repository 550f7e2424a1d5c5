//! JSON API handlers

pub mod buildinfo;
pub mod health;
pub mod preference;
pub mod session;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use preference::preference_routes;
pub use session::session_routes;
