// attitude_core/src/lib.rs

// This file defines the public modules of the library.
pub mod error;
pub mod estimation;
pub mod layout;
pub mod models;
pub mod prelude;
pub mod state;
pub mod tracking;
pub mod types;
