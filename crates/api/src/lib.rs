pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use error::ApiError;
pub use routes::{create_routes, AppState};
