//! Execution engine for aclsync
//!
//! The engine orchestrates:
//! 1. Planning - Resolve each declaration and diff it against live grants
//! 2. Displaying - Render the combined plan
//! 3. Executing - Write changed ACLs in parallel

pub mod differ;
pub mod executor;

pub use executor::{ExecuteOptions, execute, plan_all};
