mod url;

pub use url::{ApiResponse, CreateUrlRequest, HealthResponse, Status};
