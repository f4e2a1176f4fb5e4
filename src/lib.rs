//! kube-job-watcher logs the lifecycle of `batch/v1` Jobs across the whole cluster.
//!
//! A [`Controller`] subscribes to a list-watch of Jobs through an informer
//! (a watcher feeding a reflector cache) and reacts to each add, update and delete.
//! Updates re-read the Job from the cache before logging its status,
//! so the logged status is never older than what the cache held at the time of the event.
//!
//! Nothing is ever written back to the apiserver.

pub mod controller;
pub use controller::{Controller, JobLogger, Line};
mod error;
pub use error::Error;
pub mod handler;
pub use handler::Handler;
mod runner;
pub use runner::run;
pub mod subscriber;
