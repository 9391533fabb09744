//! Stateless repositories, one per aggregate.
//!
//! Every method takes `&Connection`; transaction scope is the caller's
//! responsibility (see [`crate::store::InterviewStore`] for the
//! transactional facade).

pub mod answer;
pub mod evaluation;
pub mod follow_up;
pub mod interview;
pub mod question;

pub use answer::AnswerRepo;
pub use evaluation::EvaluationRepo;
pub use follow_up::FollowUpRepo;
pub use interview::InterviewRepo;
pub use question::QuestionRepo;
