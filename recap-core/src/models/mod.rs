pub mod summary;
pub mod transcript;
pub mod user;

pub use summary::{Summary, SummaryRecord};
pub use transcript::Transcript;
pub use user::User;
