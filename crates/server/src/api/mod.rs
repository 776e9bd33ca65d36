pub mod collages;
pub mod error;
pub mod forums;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod sandbox;
pub mod torrentgroup;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
