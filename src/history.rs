use chrono::Utc;

use crate::types::{GeneratedImage, ImageHandle};

/// Posters generated during this process, newest first.
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: Vec<GeneratedImage>,
    last_id: i64,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a poster at the front of the list and returns the new entry.
    pub fn push(&mut self, image: ImageHandle, style_name: impl Into<String>) -> &GeneratedImage {
        let now = Utc::now().timestamp_millis();
        // millisecond ids collide on fast back-to-back runs; keep them strictly increasing
        let id = now.max(self.last_id + 1);
        self.last_id = id;
        self.entries.insert(
            0,
            GeneratedImage {
                id: id.to_string(),
                image,
                style_name: style_name.into(),
                timestamp: now,
            },
        );
        &self.entries[0]
    }

    /// Removes the entry with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn list(&self) -> &[GeneratedImage] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(tag: &str) -> ImageHandle {
        ImageHandle::from_bytes("image/png", tag.as_bytes())
    }

    #[test]
    fn newest_entry_is_first() {
        let mut h = HistoryStore::new();
        h.push(handle("a"), "Studio");
        h.push(handle("b"), "Nordic");
        assert_eq!(h.list().len(), 2);
        assert_eq!(h.list()[0].style_name, "Nordic");
        assert_eq!(h.list()[1].style_name, "Studio");
    }

    #[test]
    fn ids_are_unique_even_within_one_millisecond() {
        let mut h = HistoryStore::new();
        for i in 0..50 {
            h.push(handle(&i.to_string()), "Studio");
        }
        let mut ids: Vec<_> = h.list().iter().map(|e| e.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn delete_removes_exactly_one_entry() {
        let mut h = HistoryStore::new();
        let first = h.push(handle("a"), "A").id.clone();
        let second = h.push(handle("b"), "B").id.clone();
        let third = h.push(handle("c"), "C").id.clone();

        assert!(h.delete(&second));
        let left: Vec<_> = h.list().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(left, vec![third.as_str(), first.as_str()]);

        assert!(!h.delete(&second));
        assert!(!h.delete("nope"));
        assert_eq!(h.list().len(), 2);
    }
}
