//! Live session orchestration
//!
//! Manages the lifecycle of a broadcast session: creation, going live,
//! participant admission (with co-star verification), in-session tips,
//! recording and highlight generation. Media transport, transcoding,
//! verification decisions and payment settlement are external collaborators
//! consumed through the traits in [`clients`].

pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;

pub use error::{AppError, Result};
