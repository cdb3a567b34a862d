//src/codec.rs
use crate::models::DropdownItem;
use tracing::debug;

/// Separator used between words in a storage key.
pub const KEY_SEPARATOR: char = '_';

/// Normalizes a user-entered exercise name to its storage key.
///
/// Trims, lower-cases, and joins whitespace-separated words with
/// [`KEY_SEPARATOR`]. Applying it to its own output is a no-op.
pub fn to_storage_key(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string())
}

/// Turns a storage key back into a readable label ("bench_press" -> "Bench Press").
///
/// Lossy: the original capitalization of mixed-case names is not recovered.
pub fn to_display_label(key: &str) -> String {
    key.split(KEY_SEPARATOR)
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The known exercises, in selector order.
///
/// Every item goes through the codec on the way in, so labels and keys never
/// disagree. Items created locally (no entries stored yet) survive a reload
/// from the store.
#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    items: Vec<DropdownItem>,
}

impl ExerciseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the catalog with the store's key list, keeping local-only items.
    pub fn replace_with_keys(&mut self, keys: Vec<String>) {
        // Keys are used verbatim: they are what the store filters on.
        let mut items: Vec<DropdownItem> = keys
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| DropdownItem::from_key(k))
            .collect();
        items.sort_by(|a, b| a.value.cmp(&b.value));
        items.dedup_by(|a, b| a.value == b.value);

        let local_only: Vec<DropdownItem> = self
            .items
            .drain(..)
            .filter(|local| !items.iter().any(|i| i.value == local.value))
            .collect();
        debug!(
            "Catalog reloaded: {} stored, {} local-only",
            items.len(),
            local_only.len()
        );
        items.extend(local_only);
        self.items = items;
    }

    /// Adds a user-named exercise and returns the catalog's item for it.
    ///
    /// If the key is already known the existing item is returned unchanged.
    pub fn append(&mut self, display_name: &str) -> (DropdownItem, bool) {
        let item = DropdownItem::from_display_name(display_name);
        if let Some(existing) = self.get(&item.value) {
            return (existing.clone(), false);
        }
        self.items.push(item.clone());
        (item, true)
    }

    pub fn get(&self, key: &str) -> Option<&DropdownItem> {
        self.items.iter().find(|i| i.value == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn items(&self) -> &[DropdownItem] {
        &self.items
    }

    /// Selector options: the known exercises followed by the "new exercise" sentinel.
    pub fn dropdown_items(&self) -> Vec<DropdownItem> {
        let mut options = self.items.clone();
        options.push(DropdownItem::new_exercise());
        options
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
