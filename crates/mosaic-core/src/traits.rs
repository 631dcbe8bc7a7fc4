//! Traits implemented by values stored in object-bearing storages.

use crate::id::ObjectId;

/// A value with a stable identity.
///
/// Object, dense and continuous storages use the id to select, move and
/// remove individual objects. Two values with the same id are the same
/// object as far as storage is concerned, even if their other fields differ.
pub trait Identified {
    /// The object's identity.
    fn id(&self) -> ObjectId;
}

impl Identified for ObjectId {
    fn id(&self) -> ObjectId {
        *self
    }
}

impl<T: Identified> Identified for Box<T> {
    fn id(&self) -> ObjectId {
        (**self).id()
    }
}
