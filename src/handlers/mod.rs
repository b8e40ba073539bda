// Route handlers, grouped by the resource they serve:
//
//   branch - /users/:user_id/branches*, /branches/:branch_id*
//   user   - /current-user
//   health - /, /health
pub mod branch;
pub mod health;
pub mod user;

pub use branch::*;
pub use health::{health, root};
pub use user::*;
