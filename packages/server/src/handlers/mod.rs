pub mod assets;
pub mod link;
pub mod redirect;
