//! Vigil - A timed stimulus-response trial engine
//!
//! Vigil drives short attention/impulsivity mini-games: it schedules stimuli on a single
//! logical clock, classifies each response against a signal-detection taxonomy, folds the
//! outcomes into running statistics and scores the finished session.

pub mod domain;
pub mod engine;
pub mod error;
pub mod id;
pub mod runner;
pub mod storage;

pub use error::{Result, VigilError};
