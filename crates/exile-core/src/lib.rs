//! # exile-core
//!
//! Remote object model for reading a game's UI out of another process.
//!
//! This crate provides:
//! - Frame- and time-scoped value caches driven by an injectable frame counter and clock
//! - Address-indexed remote objects and an object factory with a weak registry
//! - The UI element tree: children, parent chain, visibility and screen geometry
//! - Entity components such as [`Life`]
//! - A sparse memory image format for offline inspection
//!
//! Raw bytes come from a [`ReadMemory`] implementation supplied by the host.
//! Nothing here fails hard: unbound addresses, torn reads and broken pointer
//! chains all degrade to neutral values or the null sentinel.

pub mod cache;
pub mod component;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod element;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod memory;
pub mod object;
pub mod roots;

pub use cache::{CachePolicy, CacheScope, CachedValue, Clock, FrameCounter, ManualClock, SystemClock};
pub use component::{Component, Life};
pub use config::{ContextConfig, ContextConfigBuilder};
pub use context::{RemoteContext, RemoteContextBuilder};
pub use diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use element::Element;
pub use elements::FixedSlotItem;
pub use error::{Error, Result};
pub use geometry::{ColorBgra, Rect, Vec2};
pub use memory::{ImageFile, MemoryImage, ReadMemory, SurfaceSize};
pub use object::{Address, ObjectRegistry, RemoteObject};
pub use roots::UiRoots;
