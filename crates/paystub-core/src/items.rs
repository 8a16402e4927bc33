//! Ordered line item collection with copy-on-write updates
//!
//! Every edit returns a new list and leaves the receiver untouched, so a
//! snapshot taken for an export can never be changed underneath it.

use crate::types::{Category, LineItem, LineItemId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Line items in insertion order, addressed by id
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ItemList {
    items: Vec<LineItem>,
}

impl ItemList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &LineItemId) -> bool {
        self.get(id).is_some()
    }

    /// Append `item` at the end
    pub fn with_item(&self, item: LineItem) -> Self {
        let mut items = self.items.clone();
        items.push(item);
        Self { items }
    }

    /// Append a fresh item with the "add" defaults and return its id
    pub fn with_new_item(&self, category: Category) -> (Self, LineItemId) {
        let item = LineItem::new(category);
        let id = item.id.clone();
        (self.with_item(item), id)
    }

    /// Replace the record carrying `id`, keeping its position.
    ///
    /// The replacement keeps the original id even if `item` carries another one.
    /// An unknown id leaves the list as it was.
    pub fn replacing(&self, id: &LineItemId, item: LineItem) -> Self {
        let items = self
            .items
            .iter()
            .map(|existing| {
                if &existing.id == id {
                    LineItem {
                        id: existing.id.clone(),
                        ..item.clone()
                    }
                } else {
                    existing.clone()
                }
            })
            .collect();
        Self { items }
    }

    /// Replace the record carrying `id` with `edit` applied to a copy of it
    pub fn updating(&self, id: &LineItemId, edit: impl FnOnce(&mut LineItem)) -> Self {
        match self.get(id) {
            Some(existing) => {
                let mut updated = existing.clone();
                edit(&mut updated);
                self.replacing(id, updated)
            }
            None => self.clone(),
        }
    }

    /// Drop the record carrying `id`
    pub fn without(&self, id: &LineItemId) -> Self {
        let items = self
            .items
            .iter()
            .filter(|item| &item.id != id)
            .cloned()
            .collect();
        Self { items }
    }
}

impl FromIterator<LineItem> for ItemList {
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ItemList {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(list: &ItemList) -> Vec<Category> {
        list.iter().map(|item| item.category).collect()
    }

    #[test]
    fn test_with_item_keeps_insertion_order() {
        let list = ItemList::new()
            .with_item(LineItem::new(Category::Bookkeeping))
            .with_item(LineItem::new(Category::PhotoCapture))
            .with_item(LineItem::new(Category::Others));

        assert_eq!(
            categories(&list),
            vec![Category::Bookkeeping, Category::PhotoCapture, Category::Others]
        );
    }

    #[test]
    fn test_updates_do_not_touch_the_original() {
        let (original, id) = ItemList::new().with_new_item(Category::SalvageBid);
        let edited = original.updating(&id, |item| item.rate = Some(45.0));

        assert_eq!(original.get(&id).unwrap().rate, Some(0.0));
        assert_eq!(edited.get(&id).unwrap().rate, Some(45.0));
    }

    #[test]
    fn test_replacing_keeps_position_and_id() {
        let first = LineItem::new(Category::Bookkeeping);
        let second = LineItem::new(Category::CccProfile);
        let second_id = second.id.clone();
        let list = ItemList::new().with_item(first).with_item(second);

        let replacement = LineItem::new(Category::PhotoRenaming).with_quantity(3.0);
        let list = list.replacing(&second_id, replacement);

        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[1].id, second_id);
        assert_eq!(list.as_slice()[1].category, Category::PhotoRenaming);
        assert_eq!(list.as_slice()[1].quantity, Some(3.0));
    }

    #[test]
    fn test_unknown_id_is_a_no_op() {
        let (list, _) = ItemList::new().with_new_item(Category::Others);
        let stranger = LineItemId::from("missing");

        assert_eq!(list.without(&stranger), list);
        assert_eq!(list.updating(&stranger, |item| item.note.push('x')), list);
        assert_eq!(
            list.replacing(&stranger, LineItem::new(Category::Bookkeeping)),
            list
        );
    }

    #[test]
    fn test_without_removes_only_the_matching_item() {
        let (list, a) = ItemList::new().with_new_item(Category::Others);
        let (list, b) = list.with_new_item(Category::Bookkeeping);
        let (list, c) = list.with_new_item(Category::SalvageBid);

        let list = list.without(&b);
        assert!(list.contains(&a));
        assert!(!list.contains(&b));
        assert!(list.contains(&c));
        assert_eq!(categories(&list), vec![Category::Others, Category::SalvageBid]);
    }
}
