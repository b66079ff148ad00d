//! Shared primitives for the ccproxy crates

mod error;

pub use error::HttpError;
