//! Document encryption: protecting with a password and unlocking.
//!
//! Only the Standard security handler is supported. New documents are
//! protected with 128-bit RC4 (revision 3), which every viewer accepts;
//! unlocking additionally understands 40-bit RC4 and AES-128 files.

mod permissions;
mod protect;
mod standard;
mod unlock;

pub use permissions::Permissions;
pub use protect::{protect, ProtectionOptions};
pub use unlock::unlock;

pub(crate) use unlock::decrypt_document;
