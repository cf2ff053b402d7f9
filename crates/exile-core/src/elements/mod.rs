//! Specialized element views

mod inventory;

pub use inventory::FixedSlotItem;
