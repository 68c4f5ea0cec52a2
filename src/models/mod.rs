pub mod course;
pub mod subscription;
pub mod term;
pub mod user;

pub use course::{Course, CourseStatus};
pub use subscription::{Subscription, TrackOutcome, UntrackOutcome};
pub use term::{Session, Term, default_term, relevant_terms};
pub use user::User;
