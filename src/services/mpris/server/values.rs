use std::collections::HashMap;

use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::services::mpris::{
    MprisError,
    metadata::{Metadata, MetadataValue},
    types::TrackId,
};

/// D-Bus form of a metadata map (`a{sv}`)
pub type MetadataMap = HashMap<String, OwnedValue>;

/// Object path of a track id
///
/// # Errors
/// Returns error if the generated path is not a valid object path
pub fn track_path(id: TrackId) -> Result<OwnedObjectPath, MprisError> {
    OwnedObjectPath::try_from(id.object_path()).map_err(|e| MprisError::Dbus(e.into()))
}

/// Track id of an object path received from a client
///
/// # Errors
/// Returns [`MprisError::InvalidValue`] for paths this bridge never hands out
pub fn track_id(path: &ObjectPath<'_>) -> Result<TrackId, MprisError> {
    TrackId::from_object_path(path.as_str())
}

/// Object paths for a list of track ids
///
/// # Errors
/// Returns error if any generated path is invalid
pub fn track_paths(ids: &[TrackId]) -> Result<Vec<OwnedObjectPath>, MprisError> {
    ids.iter().copied().map(track_path).collect()
}

/// Convert a metadata map to its D-Bus form
///
/// # Errors
/// Returns error if a value cannot be represented as a variant
pub fn metadata_map(metadata: &Metadata) -> Result<MetadataMap, MprisError> {
    metadata
        .iter()
        .map(|(key, value)| Ok((key.to_string(), owned(value)?)))
        .collect()
}

fn owned(value: &MetadataValue) -> Result<OwnedValue, MprisError> {
    let value = match value {
        MetadataValue::Text(text) => Value::from(text.clone()),
        MetadataValue::TextList(list) => Value::from(list.clone()),
        MetadataValue::Int(number) => Value::from(*number),
        MetadataValue::Track(id) => Value::from(track_path(*id)?.into_inner()),
    };
    OwnedValue::try_from(value).map_err(|e| MprisError::Dbus(e.into()))
}
