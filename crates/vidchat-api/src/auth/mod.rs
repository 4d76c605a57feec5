//! Session resolution for protected routes.
//!
//! The user system itself lives elsewhere. This module only turns request
//! credentials into a [`UserSession`] through the [`SessionResolver`] seam.

pub mod middleware;
pub mod models;
pub mod session;

pub use middleware::session_middleware;
pub use models::UserSession;
pub use session::{JwtSessionResolver, SessionResolver};
