//! Wire format types for the client-facing protocol
//!
//! Pure serde structs matching the Anthropic Messages API as far as this
//! adapter consumes and produces it.

pub mod anthropic;
