//! Expirable store contracts.
//!
//! # Responsibilities
//! - Define what the scheduler needs from the owner of expirable objects
//! - Provide reference stores (in-memory, directory of files)
//!
//! # Design Decisions
//! - The scheduler only knows identities; the store resolves them to objects
//! - `destroy` runs on the coordinator task and must not call back into it
//!   synchronously

pub mod directory;
pub mod memory;

pub use directory::{DirectoryStore, StoredFile};
pub use memory::MemoryStore;

use std::sync::Arc;

use crate::expiration::ExpirableId;

/// An object that can be scheduled for expiration.
pub trait Expirable {
    /// Stable key used by the registry.
    fn expiration_id(&self) -> ExpirableId;
}

impl Expirable for ExpirableId {
    fn expiration_id(&self) -> ExpirableId {
        self.clone()
    }
}

impl<T: Expirable + ?Sized> Expirable for &T {
    fn expiration_id(&self) -> ExpirableId {
        (**self).expiration_id()
    }
}

/// Owner of expirable objects; performs the actual removal.
pub trait ExpirableStore: Send + Sync + 'static {
    type Object: Send;

    /// Resolve an identity. `None` if the object is already gone.
    fn lookup(&self, id: &ExpirableId) -> Option<Self::Object>;

    /// Remove the object.
    fn destroy(&self, object: Self::Object);
}

impl<S: ExpirableStore> ExpirableStore for Arc<S> {
    type Object = S::Object;

    fn lookup(&self, id: &ExpirableId) -> Option<Self::Object> {
        (**self).lookup(id)
    }

    fn destroy(&self, object: Self::Object) {
        (**self).destroy(object)
    }
}
