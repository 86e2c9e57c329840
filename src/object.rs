//! Object identity binding.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A typed record that can travel the link as an object frame.
///
/// The ID is a compile-time property of the type: it identifies the record
/// shape on the wire, must be unique among all types used on one link, and
/// must be non-negative (negative IDs are reserved). The field schema comes
/// from the type's `Serialize`/`Deserialize` derive, interpreted by the
/// [`codec`](crate::codec) module.
///
/// # Example
///
/// ```
/// use serde::{Serialize, Deserialize};
/// use serimux::WireObject;
///
/// #[derive(Serialize, Deserialize)]
/// struct Pose {
///     x: f32,
///     y: f32,
///     heading: f32,
/// }
///
/// impl WireObject for Pose {
///     const OBJECT_ID: i16 = 3;
/// }
/// ```
pub trait WireObject: Serialize + DeserializeOwned {
    /// Wire identifier for this record type. Must be `>= 0`.
    const OBJECT_ID: i16;
}
