pub mod alert;
pub mod probe;
pub mod registry;
