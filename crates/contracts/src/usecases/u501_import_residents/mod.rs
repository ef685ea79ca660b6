pub mod candidate;
pub mod request;
pub mod response;
pub mod schema;
pub mod session;

pub use candidate::{CandidateField, ResidentCandidate, RowError};
pub use schema::ImportSchema;
pub use session::{
    ImportProgress, ImportResults, ImportStage, ProgressSnapshot, RowFailure, SessionSnapshot,
};
