#![warn(clippy::unwrap_used)]

pub mod dataset_rest;
pub mod error;
pub mod extract;
pub mod rest;
pub mod server;
pub mod session;
pub mod swagger;

pub use error::ApiError;
pub use rest::AppState;
pub use server::{build_router, ApiServer};
pub use session::SessionStore;
pub use swagger::ApiDoc;
