use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// A record type that lives in its own snapshot.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Storage key of the snapshot holding every record of this type.
    const KEY: &'static str;

    /// Partial update merged over an existing record.
    type Patch: Send;

    /// Identity within the snapshot; derived for records without an id field.
    fn id(&self) -> Cow<'_, str>;

    fn apply(&mut self, patch: Self::Patch);

    /// Built-in sample set used when no snapshot exists yet.
    fn seed() -> Vec<Self>;
}

/// Overwrites `slot` when the patch carries a value.
pub(crate) fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
