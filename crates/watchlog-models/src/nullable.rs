use serde::{Deserialize, Deserializer};

/// Read an explicit `null` the same way as a missing key: the type's default.
///
/// Backups written by other clients often serialize unset descriptive fields
/// as `null`, which plain `#[serde(default)]` rejects.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
