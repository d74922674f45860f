//! State history domain

mod buffer;

pub use buffer::{StateHistoryBuffer, DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY};
