//! Session descriptors and the session resolution seam.
//!
//! Sessions are resolved from filesystem paths by an external collaborator.
//! The core only depends on the small set of paths collected in
//! [`SessionDescriptor`]; everything else about session layout stays behind
//! the [`SessionResolver`] trait.

mod resolver;
mod types;

pub use resolver::{FsSessionResolver, SessionResolver};
pub use types::{SessionDescriptor, SessionError};
