//! Persistence of the user's explicit place selection.
//!
//! The selection survives restarts until cleared; the resolver treats it as
//! an input and never mutates it.

use skyclock_core::store::{SharedStore, StoreError, SELECTED_PLACE_KEY};

use crate::types::PlaceCandidate;

/// Load the persisted selection, if any. A malformed stored value is treated
/// as no selection.
pub fn load(store: &SharedStore) -> Option<PlaceCandidate> {
    let json = store.lock().get(SELECTED_PLACE_KEY)?;
    match serde_json::from_str(&json) {
        Ok(place) => Some(place),
        Err(e) => {
            tracing::warn!("Ignoring malformed selected place: {}", e);
            None
        }
    }
}

/// Persist `place` as the active selection.
///
/// # Errors
/// Fails when the backing store cannot be written.
pub fn save(store: &SharedStore, place: &PlaceCandidate) -> Result<(), StoreError> {
    let json = serde_json::to_string(place)?;
    store.lock().set(SELECTED_PLACE_KEY, &json)
}

/// Clear the selection (back to device position).
///
/// # Errors
/// Fails when the backing store cannot be written.
pub fn clear(store: &SharedStore) -> Result<(), StoreError> {
    store.lock().remove(SELECTED_PLACE_KEY)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use skyclock_core::store::{shared, MemoryStore};

    fn place() -> PlaceCandidate {
        PlaceCandidate {
            display_name: "Berlin, Deutschland".to_string(),
            latitude: 52.52,
            longitude: 13.405,
            weather: None,
        }
    }

    #[test]
    fn test_save_load_clear() {
        let store = shared(MemoryStore::new());
        assert!(load(&store).is_none());

        save(&store, &place()).unwrap();
        assert_eq!(load(&store), Some(place()));

        clear(&store).unwrap();
        assert!(load(&store).is_none());
    }

    #[test]
    fn test_malformed_selection_is_none() {
        let store = shared(MemoryStore::new());
        store.lock().set(SELECTED_PLACE_KEY, "{broken").unwrap();
        assert!(load(&store).is_none());
    }
}
