pub mod compress;
pub mod document;
pub mod remove;
pub mod unlock;

#[cfg(test)]
pub mod testing;

pub use document::{OpenAttempt, PdfDocument};
