pub mod collaborators;
pub mod journal;

pub use journal::SnapdayCli;
pub use journal::run;
