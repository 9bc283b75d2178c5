pub mod caller;
pub mod payload;
