pub mod identity;

pub use identity::{IDENTITY_HEX_LEN, IdentityError, IdentityHash, IdentityHasher};
