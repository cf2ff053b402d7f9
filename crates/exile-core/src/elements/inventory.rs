//! Items in fixed-slot stash tabs (blight, delve)
//!
//! These tabs lay items out themselves: the item's own inventory position is
//! meaningless and its on-screen rectangle is the slot it sits in.

use crate::context::RemoteContext;
use crate::element::Element;
use crate::geometry::Rect;
use crate::object::{Address, RemoteObject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSlotItem {
    element: Element,
}

impl RemoteObject for FixedSlotItem {
    fn from_address(ctx: &RemoteContext, address: Address) -> Self {
        Self {
            element: ctx.get_object(address),
        }
    }

    fn address(&self) -> Address {
        self.element.address()
    }

    fn context(&self) -> &RemoteContext {
        self.element.context()
    }
}

impl FixedSlotItem {
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Always `(0, 0)`
    pub fn inventory_position(&self) -> (i32, i32) {
        (0, 0)
    }

    /// Rectangle of the enclosing slot
    pub fn client_rect(&self) -> Rect {
        self.element
            .parent()
            .map(|slot| slot.client_rect())
            .unwrap_or_default()
    }

    pub fn client_rect_cached(&self) -> Rect {
        self.element
            .parent()
            .map(|slot| slot.client_rect_cached())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FrameCounter;
    use crate::memory::MockMemoryBuilder;
    use crate::memory::layout::{ElementOffsets, element};
    use std::sync::Arc;

    const SLOT: u64 = 0x2000;
    const ITEM: u64 = 0x3000;

    fn header(address: u64, parent: u64) -> ElementOffsets {
        ElementOffsets {
            self_pointer: address,
            parent,
            scale: 1.0,
            is_visible_local: element::VISIBLE_FLAG,
            ..Default::default()
        }
    }

    #[test]
    fn test_rect_comes_from_slot() {
        let mut slot = header(SLOT, 0);
        slot.x = 40.0;
        slot.y = 60.0;
        slot.width = 70.0;
        slot.height = 70.0;
        let mut item = header(ITEM, SLOT);
        item.x = 5.0;
        item.width = 10.0;
        item.height = 10.0;

        let reader = Arc::new(
            MockMemoryBuilder::new()
                .write_pod(SLOT, &slot)
                .write_pod(ITEM, &item)
                .build(),
        );
        let ctx = RemoteContext::builder(reader)
            .frames(FrameCounter::new())
            .build();
        let item: FixedSlotItem = ctx.get_object(ITEM);

        assert_eq!(item.client_rect(), Rect::new(40.0, 60.0, 70.0, 70.0));
        assert_eq!(item.client_rect_cached(), item.client_rect());
        assert_eq!(item.inventory_position(), (0, 0));
        assert_ne!(item.client_rect(), item.element().client_rect());
    }

    #[test]
    fn test_orphan_item_has_empty_rect() {
        let reader = Arc::new(MockMemoryBuilder::new().build());
        let ctx = RemoteContext::builder(reader)
            .frames(FrameCounter::new())
            .build();
        let item: FixedSlotItem = ctx.get_object(ITEM);

        assert_eq!(item.client_rect(), Rect::default());
    }
}
