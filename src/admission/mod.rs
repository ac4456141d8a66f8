//! Newcomer admission flow and the event loop that feeds it.

mod controller;
mod runner;

pub use controller::{AdmissionController, AdmissionError};
pub use runner::EventRunner;
