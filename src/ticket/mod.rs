//! Ticket handling: raw issue-tracker JSON in, `ProgrammingTask` out.
//!
//! `extract` pulls plain text and custom-field signals out of a raw ticket,
//! `normalize` assembles them into the canonical task record. Neither does I/O.

pub mod extract;
pub mod normalize;

pub use extract::{
    NO_DESCRIPTION, extract_text, find_acceptance_criteria, find_affected_repositories,
    is_present,
};
pub use normalize::{NO_TITLE, ProgrammingTask, normalize, string_list};
