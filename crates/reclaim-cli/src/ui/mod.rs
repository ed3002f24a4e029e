//! UI Module - terminal output for cleanup runs
//!
//! ```text
//! ┌─────────────┐
//! │  Reclaimer  │  (reclaim-core)
//! └──────┬──────┘
//!        │ journal lines
//!        ▼
//! ┌─────────────┐
//! │   Output    │  Reporter implementation
//! └──────┬──────┘
//!        │ styles with
//!        ▼
//! ┌─────────────┐
//! │ Theme/Table │  Colors, icons, usage tables
//! └─────────────┘
//! ```

pub mod output;
pub mod table;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
