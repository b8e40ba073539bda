pub mod current;

pub use current::current_user;
