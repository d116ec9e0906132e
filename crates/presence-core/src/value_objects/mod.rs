//! Value objects - immutable types identified by their value

mod subject_id;

pub use subject_id::SubjectId;
