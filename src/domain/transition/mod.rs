//! Transition domain - learned state-to-state probabilities

mod model;

pub use model::{TransitionEntry, TransitionModel, DEFAULT_LEARNING_RATE, ROW_SUM_EPSILON};
