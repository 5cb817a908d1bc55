//! Export services operating over a thread's persisted state.

pub mod export;
