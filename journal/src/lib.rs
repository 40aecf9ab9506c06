//! Daily snapshot journal: one entry per local calendar day, a countdown
//! while the day is used up, and a background reminder once it is not.
//!
//! Two keys are persisted. `entries` is written only by the foreground
//! ([`repository`], via [`gate`]); `nextAvailableTime` is written by the gate
//! and cleared by whichever of the [`countdown`] or the [`scheduler`] sees it
//! expire first.

pub mod carousel;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod countdown;
pub mod deadline;
pub mod error;
pub mod factory;
pub mod gate;
pub mod inject;
pub mod migrate;
pub mod repository;
pub mod scheduler;
pub mod store;
pub mod timelapse;
pub mod types;

pub use error::JournalError;
pub use error::Result;
