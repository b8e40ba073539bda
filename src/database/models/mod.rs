pub mod branch;
pub mod note;
pub mod sharing;
pub mod user;

pub use branch::{Branch, PopulatedBranch};
pub use note::Note;
pub use sharing::BranchSharingInfo;
pub use user::User;
