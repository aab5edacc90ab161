pub mod download;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod pipeline;
pub mod progress;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;
