//! HTTP request handlers.

mod health;
mod search;
mod tasks;

pub use health::{health_check, metrics_handler};
pub use search::search;
pub use tasks::{download_file, get_status, submit_download};
