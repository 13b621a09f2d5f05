//! Reusable rendering helpers shared across screens.

pub mod fmt;
pub mod sub_tabs;
