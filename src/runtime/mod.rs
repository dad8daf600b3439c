//! Minimal async runtime used to run encodes off the caller's thread.

pub mod channel;
pub mod executor;
pub mod task;
pub mod worker;

pub use executor::Executor;
pub use worker::{EncodeContent, EncodeHandle, EncodeRequest, EncodeResponse, spawn_encode};
