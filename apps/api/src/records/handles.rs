//! Process-local registry of rendered images handed out to views.
//!
//! The Rust rendition of an object-URL table: a handle registers the image
//! bytes under a fresh id and removes the entry when dropped, so a torn-down
//! view cannot leak table entries.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct HandleTable {
    entries: Arc<Mutex<HashMap<Uuid, Bytes>>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the bytes and returns the owning handle.
    pub fn insert(&self, bytes: Bytes) -> ImageHandle {
        let id = Uuid::new_v4();
        self.entries
            .lock()
            .expect("handle table lock poisoned")
            .insert(id, bytes.clone());
        ImageHandle {
            id,
            bytes,
            table: self.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("handle table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive, view-scoped access to one rendered image. Dropping the handle
/// releases its table entry.
pub struct ImageHandle {
    id: Uuid,
    bytes: Bytes,
    table: HandleTable,
}

impl ImageHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        if let Ok(mut entries) = self.table.entries.lock() {
            entries.remove(&self.id);
        }
    }
}
