//! Lazily rebuilt view of the visible text.

use std::collections::HashMap;

use crate::crdt::item::Item;
use crate::crdt::types::OperationId;

#[derive(Debug, Clone, Default)]
struct View {
    text: String,
    /// Indexes into the document order of every visible item
    visible: Vec<usize>,
}

/// Caches the visible text and the positions of the visible items.
///
/// The cache is dropped on every mutation and rebuilt on the next read, so a
/// read after a read costs nothing.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    cache: Option<View>,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn is_fresh(&self) -> bool {
        self.cache.is_some()
    }

    /// The visible text for `order`.
    pub fn text(&mut self, order: &[OperationId], items: &HashMap<OperationId, Item>) -> &str {
        &self.view(order, items).text
    }

    /// Positions in `order` of the visible items, left to right.
    pub fn visible(
        &mut self,
        order: &[OperationId],
        items: &HashMap<OperationId, Item>,
    ) -> &[usize] {
        &self.view(order, items).visible
    }

    fn view(&mut self, order: &[OperationId], items: &HashMap<OperationId, Item>) -> &View {
        self.cache.get_or_insert_with(|| {
            let mut view = View::default();
            for (index, id) in order.iter().enumerate() {
                if let Some(item) = items.get(id).filter(|item| item.is_visible()) {
                    view.text.push(item.value);
                    view.visible.push(index);
                }
            }
            view
        })
    }
}
