//! Edit element collection with linear undo history.

use crate::coords::PercentPoint;
use crate::error::{Error, Result};
use crate::model::{EditElement, ElementId, ElementPatch, StyleOverrides};
use crate::parser::EditorConfig;

/// Immutable copy of the element collection at one point in history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    elements: Vec<EditElement>,
}

impl HistorySnapshot {
    pub fn elements(&self) -> &[EditElement] {
        &self.elements
    }
}

/// Owns all edit elements of a session.
///
/// Every mutation except [`move_element`](Self::move_element) records a
/// snapshot and drops any redo tail. Drags call `move_element` repeatedly
/// and [`commit_movement`](Self::commit_movement) once at the end.
#[derive(Debug, Clone)]
pub struct EditElementStore {
    elements: Vec<EditElement>,
    history: Vec<HistorySnapshot>,
    cursor: usize,
    next_id: u64,
    defaults: EditorConfig,
}

impl EditElementStore {
    pub fn new(defaults: EditorConfig) -> Self {
        Self {
            elements: Vec::new(),
            history: vec![HistorySnapshot::default()],
            cursor: 0,
            next_id: 1,
            defaults,
        }
    }

    /// All elements in creation order.
    pub fn elements(&self) -> &[EditElement] {
        &self.elements
    }

    pub fn get(&self, id: ElementId) -> Option<&EditElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn elements_on_page(&self, page_number: u32) -> impl Iterator<Item = &EditElement> {
        self.elements
            .iter()
            .filter(move |e| e.page_number == page_number)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    /// Number of recorded snapshots, including the initial empty one.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Create an element; unset style fields take the editor defaults.
    pub fn create_element(
        &mut self,
        page_number: u32,
        anchor: PercentPoint,
        text: impl Into<String>,
        overrides: StyleOverrides,
    ) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;

        let d = &self.defaults;
        let element = EditElement {
            id,
            text: text.into(),
            anchor,
            font_size: overrides.font_size.unwrap_or(d.default_font_size),
            font_family: overrides.font_family.unwrap_or(d.default_family),
            bold: overrides.bold.unwrap_or(false),
            italic: overrides.italic.unwrap_or(false),
            color: overrides.color.unwrap_or(d.default_color),
            rotation: overrides.rotation.unwrap_or(0.0),
            opacity: overrides.opacity.unwrap_or(1.0).clamp(0.0, 1.0),
            alignment: overrides.alignment.unwrap_or(d.default_alignment),
            horizontal_scaling: overrides.horizontal_scaling.unwrap_or(100.0),
            background_color: overrides.background_color,
            original_rect: overrides.original_rect,
            page_number,
        };

        log::debug!("Created element {} on page {}", id, page_number);
        self.elements.push(element);
        self.snapshot();
        id
    }

    /// Apply a partial update.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> Result<()> {
        let element = self.find_mut(id)?;
        patch.apply_to(element);
        self.snapshot();
        Ok(())
    }

    pub fn delete_element(&mut self, id: ElementId) -> Result<()> {
        let pos = self.position(id)?;
        self.elements.remove(pos);
        self.snapshot();
        Ok(())
    }

    /// Move an element without recording history.
    pub fn move_element(&mut self, id: ElementId, x_percent: f32, y_percent: f32) -> Result<()> {
        let element = self.find_mut(id)?;
        element.anchor = PercentPoint::new(x_percent, y_percent);
        Ok(())
    }

    /// Record pending moves. Returns false when nothing changed.
    pub fn commit_movement(&mut self) -> bool {
        if !self.has_pending_moves() {
            return false;
        }
        self.snapshot();
        true
    }

    /// Step back one snapshot. Returns whether anything changed.
    ///
    /// Uncommitted moves are discarded first, without stepping back.
    pub fn undo(&mut self) -> bool {
        if self.has_pending_moves() {
            self.restore();
            return true;
        }
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        self.restore();
        true
    }

    /// Step forward one snapshot. Returns whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        self.restore();
        true
    }

    /// Drop all elements and history. Ids keep increasing.
    pub fn reset(&mut self) {
        self.elements.clear();
        self.history = vec![HistorySnapshot::default()];
        self.cursor = 0;
    }

    fn has_pending_moves(&self) -> bool {
        self.history[self.cursor].elements != self.elements
    }

    fn snapshot(&mut self) {
        self.history.truncate(self.cursor + 1);
        self.history.push(HistorySnapshot {
            elements: self.elements.clone(),
        });
        self.cursor = self.history.len() - 1;
    }

    fn restore(&mut self) {
        self.elements = self.history[self.cursor].elements.clone();
    }

    fn position(&self, id: ElementId) -> Result<usize> {
        self.elements
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::ElementNotFound(id.0))
    }

    fn find_mut(&mut self, id: ElementId) -> Result<&mut EditElement> {
        let pos = self.position(id)?;
        Ok(&mut self.elements[pos])
    }
}

impl Default for EditElementStore {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, Color};
    use crate::style::CanonicalFamily;

    fn anchor() -> PercentPoint {
        PercentPoint::new(10.0, 20.0)
    }

    #[test]
    fn test_create_uses_defaults() {
        let mut store = EditElementStore::default();
        let id = store.create_element(
            2,
            anchor(),
            "Hi",
            StyleOverrides::new().with_color(Color::rgb(255, 0, 0)),
        );
        let el = store.get(id).unwrap();
        assert_eq!(el.font_size, 12.0);
        assert_eq!(el.font_family, CanonicalFamily::Sans);
        assert_eq!(el.alignment, Alignment::Left);
        assert_eq!(el.color, Color::rgb(255, 0, 0));
        assert_eq!(el.opacity, 1.0);
        assert_eq!(el.horizontal_scaling, 100.0);
        assert_eq!(store.elements_on_page(2).count(), 1);
        assert_eq!(store.elements_on_page(1).count(), 0);
    }

    #[test]
    fn test_undo_redo_walks_history() {
        let mut store = EditElementStore::default();
        let a = store.create_element(1, anchor(), "a", StyleOverrides::new());
        store
            .update_element(a, &ElementPatch::text("a2"))
            .unwrap();
        let b = store.create_element(1, anchor(), "b", StyleOverrides::new());

        assert!(store.undo());
        assert!(store.get(b).is_none());
        assert_eq!(store.get(a).unwrap().text, "a2");

        assert!(store.undo());
        assert_eq!(store.get(a).unwrap().text, "a");

        assert!(store.redo());
        assert!(store.redo());
        assert!(store.get(b).is_some());
        assert!(!store.redo());
    }

    #[test]
    fn test_full_undo_then_full_redo() {
        let mut store = EditElementStore::default();
        let a = store.create_element(1, anchor(), "a", StyleOverrides::new());
        store
            .update_element(a, &ElementPatch::text("a2"))
            .unwrap();
        let b = store.create_element(2, anchor(), "b", StyleOverrides::new());
        store.move_element(b, 50.0, 60.0).unwrap();
        store.commit_movement();
        store.delete_element(a).unwrap();
        let final_state = store.elements().to_vec();

        for _ in 0..5 {
            assert!(store.undo());
        }
        assert!(store.is_empty());
        assert!(!store.undo());

        for _ in 0..5 {
            assert!(store.redo());
        }
        assert_eq!(store.elements(), final_state.as_slice());
        assert!(!store.redo());
    }

    #[test]
    fn test_undo_discards_only_pending_move() {
        let mut store = EditElementStore::default();
        let id = store.create_element(1, anchor(), "drag me", StyleOverrides::new());
        store.move_element(id, 70.0, 80.0).unwrap();

        assert!(store.undo());
        assert_eq!(store.get(id).unwrap().anchor, anchor());
        assert!(store.can_undo());
        assert!(!store.commit_movement());

        assert!(store.undo());
        assert!(store.is_empty());
    }

    #[test]
    fn test_undo_past_start_is_noop() {
        let mut store = EditElementStore::default();
        assert!(!store.undo());
        store.create_element(1, anchor(), "a", StyleOverrides::new());
        assert!(store.undo());
        assert!(store.is_empty());
        assert!(!store.undo());
        assert!(store.is_empty());
    }

    #[test]
    fn test_mutation_truncates_redo_tail() {
        let mut store = EditElementStore::default();
        store.create_element(1, anchor(), "a", StyleOverrides::new());
        store.create_element(1, anchor(), "b", StyleOverrides::new());
        store.undo();
        assert!(store.can_redo());

        store.create_element(1, anchor(), "c", StyleOverrides::new());
        assert!(!store.can_redo());
        let texts: Vec<_> = store.elements().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn test_move_then_commit() {
        let mut store = EditElementStore::default();
        let id = store.create_element(1, anchor(), "drag me", StyleOverrides::new());
        let before = store.history_len();

        store.move_element(id, 30.0, 40.0).unwrap();
        store.move_element(id, 31.0, 41.0).unwrap();
        assert_eq!(store.history_len(), before);

        assert!(store.commit_movement());
        assert_eq!(store.history_len(), before + 1);
        assert!(!store.commit_movement());
        assert_eq!(store.history_len(), before + 1);

        store.undo();
        assert_eq!(store.get(id).unwrap().anchor, anchor());
    }

    #[test]
    fn test_unknown_id_leaves_history_alone() {
        let mut store = EditElementStore::default();
        store.create_element(1, anchor(), "a", StyleOverrides::new());
        let before = store.history_len();

        let missing = ElementId(99);
        assert!(matches!(
            store.update_element(missing, &ElementPatch::text("x")),
            Err(Error::ElementNotFound(99))
        ));
        assert!(store.delete_element(missing).is_err());
        assert!(store.move_element(missing, 1.0, 1.0).is_err());
        assert_eq!(store.history_len(), before);
    }

    #[test]
    fn test_ids_not_reused_after_reset() {
        let mut store = EditElementStore::default();
        let a = store.create_element(1, anchor(), "a", StyleOverrides::new());
        store.delete_element(a).unwrap();
        store.reset();
        assert!(!store.can_undo());

        let b = store.create_element(1, anchor(), "b", StyleOverrides::new());
        assert!(b > a);
    }
}
