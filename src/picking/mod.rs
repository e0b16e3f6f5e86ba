//! Picking layer: pick bookkeeping, plot coordinate mapping and the click
//! controller.
//!
//! ```text
//!   pointer click (plot x, y, button)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ mapping   │  nearest receiver, clamped gather time
//!   └──────────┘
//!        │ ClickEvent
//!        ▼
//!   ┌──────────┐
//!   │ session   │  PickSet edits, marker draws, reports
//!   └──────────┘
//! ```

pub mod mapping;
pub mod pick;
pub mod session;
