//! # HORUS Macros
//!
//! Procedural macros for the HORUS robotics framework.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod log_summary;

/// Derive the `LogSummary` trait for a type.
///
/// Generates a default implementation that uses `Debug` formatting:
///
/// ```rust,ignore
/// #[derive(Debug, LogSummary)]
/// pub struct Range {
///     pub range: f32,
/// }
///
/// // Equivalent to:
/// // impl LogSummary for Range {
/// //     fn log_summary(&self) -> String {
/// //         format!("{:?}", self)
/// //     }
/// // }
/// ```
///
/// Large records (images, point clouds, occupancy grids) should implement
/// `LogSummary` by hand and summarize metadata only.
#[proc_macro_derive(LogSummary)]
pub fn derive_log_summary(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    log_summary::derive_log_summary(input).into()
}
