pub mod create;
pub mod list;
pub mod share;
pub mod show;
pub mod utils;

// Re-export handler functions for use in routing
pub use create::create as branch_create;
pub use list::list as branch_list;
pub use list::list_private as branch_list_private;
pub use share::share as branch_share;
pub use show::show as branch_show;
