pub mod worker;

pub use worker::{Worker, WorkerSpec};
