#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_possible_truncation, // Durations and levels stay within realistic bounds
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. DecodeError in decoder module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod decoder;
pub mod domain;
pub mod sender;
pub mod translator;

// Re-export main types for easy access
pub use app::{App, Config, DeliveryCoordinator};
pub use domain::{ErrorReport, LogEntry, LogLevel};
pub use translator::ErrorReportTranslator;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
