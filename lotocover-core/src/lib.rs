pub mod analysis;
pub mod bounds;
pub mod cancel;
pub mod candidates;
pub mod combinatorics;
pub mod config;
pub mod error;
pub mod models;
mod progress;
pub mod scenario;
pub mod solver;
pub mod universe;
pub mod validator;
