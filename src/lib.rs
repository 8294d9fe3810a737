// Library surface shared by the binary and the integration tests.
// Screen types (App, ui) stay in the binary.
pub mod app_dirs;
pub mod clock;
pub mod compare;
pub mod config;
pub mod content;
pub mod logging;
pub mod metrics;
pub mod runtime;
pub mod session;
