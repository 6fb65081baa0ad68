//! Serde helpers for backend payloads.

use serde::{Deserialize, Deserializer};

/// Reads a field the backend may send as `null`, falling back to the
/// type's default. Pair with `#[serde(default)]` to also cover absent fields.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
