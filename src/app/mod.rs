//! Application shell.
//!
//! | Sub-module   | Responsibility |
//! | ------------ | -------------- |
//! | [`scan_app`] | Per-frame channel drain, outcome handling, layout |
//! | [`run`]      | [`run_scanplot()`] entry point and icon loading |

mod run;
mod scan_app;

pub use run::run_scanplot;
pub use scan_app::ScanApp;
