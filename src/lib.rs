// Library surface for the binary, headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod auth;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod error;
pub mod keyboard;
pub mod logging;
pub mod metrics;
pub mod runtime;
pub mod scores;
pub mod session;
pub mod store;
pub mod text_generator;
pub mod ui;
pub mod util;

pub use app::{App, AppState};
pub use error::{Result, TypeRushError};
