//! The tagged value model shared by parameters, mocks and derived bindings.
pub mod ops;
pub mod raw;
pub mod types;

pub use ops::{abs_diff, checked_add, checked_sub, Group, Grouped};
pub use raw::ValueError;
pub use types::{Address, Value};
pub use ethereum_types::U256;
