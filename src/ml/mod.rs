//! Machine learning helpers for training and inference.
//!
//! Everything here is single-threaded and works one example at a time: the
//! online learners mutate their state per training pair, and the predictor
//! scores against a weight table loaded from disk.

pub mod metrics;
pub mod online;
pub mod sparse;
pub mod vocab;
