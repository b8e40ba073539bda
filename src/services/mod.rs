pub mod branch_service;

pub use branch_service::{BranchEntry, BranchError, BranchPage, BranchService, PageRequest};
