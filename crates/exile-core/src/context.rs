//! Shared state every remote object reads through
//!
//! A `RemoteContext` bundles the memory reader, the frame counter and clock
//! that drive cache invalidation, the UI root, the render surface size, the
//! named-root table and the diagnostic sink. It is cheap to clone.

use std::sync::Arc;

use bytemuck::Pod;
use parking_lot::RwLock;
use tracing::trace;

use crate::cache::{Clock, FrameCounter, SystemClock};
use crate::config::ContextConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::element::Element;
use crate::memory::layout::{NativeUtf16Text, text};
use crate::memory::{ReadMemory, SurfaceSize, decode_utf16, read_pod_dyn, read_pointer_array};
use crate::object::{Address, ObjectRegistry, RemoteObject};
use crate::roots::UiRoots;

#[derive(Clone)]
pub struct RemoteContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    reader: Arc<dyn ReadMemory>,
    frames: FrameCounter,
    clock: Arc<dyn Clock>,
    config: ContextConfig,
    sink: Arc<dyn DiagnosticSink>,
    registry: ObjectRegistry,
    ui_root: RwLock<Address>,
    surface: RwLock<SurfaceSize>,
    roots: RwLock<UiRoots>,
}

impl RemoteContext {
    /// Context with default settings, driven by the global frame counter
    pub fn new(reader: Arc<dyn ReadMemory>) -> Self {
        Self::builder(reader).build()
    }

    pub fn builder(reader: Arc<dyn ReadMemory>) -> RemoteContextBuilder {
        RemoteContextBuilder::new(reader)
    }

    pub fn reader(&self) -> &dyn ReadMemory {
        self.inner.reader.as_ref()
    }

    pub fn frames(&self) -> &FrameCounter {
        &self.inner.frames
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.inner.clock)
    }

    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.inner.registry
    }

    /// Advance the frame counter, invalidating every frame-scoped cache
    pub fn tick(&self) -> u64 {
        self.inner.frames.advance()
    }

    /// Read a value, yielding its zero value when unbound or unreadable
    pub fn read<T: Pod>(&self, address: Address) -> T {
        if address.is_null() {
            return T::zeroed();
        }
        match read_pod_dyn::<T, _>(self.reader(), address.raw()) {
            Ok(value) => value,
            Err(e) => {
                trace!("Read of {} bytes at {} failed: {}", size_of::<T>(), address, e);
                T::zeroed()
            }
        }
    }

    /// Read the pointers in `[start, end)`; shorter than the span on partial failure
    ///
    /// Spans longer than `max_child_count` pointers read as empty.
    pub fn read_pointer_array(&self, start: Address, end: Address) -> Vec<Address> {
        let limit = self.config().max_child_count;
        read_pointer_array(self.reader(), start.raw(), end.raw(), limit)
            .into_iter()
            .map(Address::new)
            .collect()
    }

    /// Read a native UTF-16 string; empty on any failure
    pub fn read_text(&self, address: Address) -> String {
        let native: NativeUtf16Text = self.read(address);
        if native.length == 0 {
            return String::new();
        }
        let length = native.length.min(text::MAX_LENGTH);

        if native.is_inline() {
            let bytes = (length as usize * 2).min(native.buffer.len());
            return decode_utf16(&native.buffer[..bytes]);
        }

        match self
            .reader()
            .read_bytes(native.heap_pointer(), length as usize * 2)
        {
            Ok(bytes) => decode_utf16(&bytes),
            Err(e) => {
                trace!("Text read at {} failed: {}", address, e);
                String::new()
            }
        }
    }

    /// Object factory: wrap `address` as `T`
    pub fn get_object<T: RemoteObject>(&self, address: impl Into<Address>) -> T {
        T::from_address(self, address.into())
    }

    pub fn ui_root(&self) -> Element {
        self.get_object(*self.inner.ui_root.read())
    }

    pub fn set_ui_root(&self, address: impl Into<Address>) {
        *self.inner.ui_root.write() = address.into();
    }

    pub fn surface_size(&self) -> SurfaceSize {
        *self.inner.surface.read()
    }

    pub fn set_surface_size(&self, surface: SurfaceSize) {
        *self.inner.surface.write() = surface;
    }

    pub fn roots(&self) -> UiRoots {
        self.inner.roots.read().clone()
    }

    pub fn set_roots(&self, roots: UiRoots) {
        *self.inner.roots.write() = roots;
    }

    /// Element registered under `name`, or the null sentinel
    pub fn named_root(&self, name: &str) -> Element {
        let address = self
            .inner
            .roots
            .read()
            .address_of(name)
            .unwrap_or(Address::NULL);
        self.get_object(address)
    }

    pub(crate) fn log_debug(&self, message: &str) {
        self.inner.sink.log_debug(message);
    }
}

impl std::fmt::Debug for RemoteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteContext")
            .field("frame", &self.inner.frames.current())
            .field("ui_root", &*self.inner.ui_root.read())
            .field("surface", &*self.inner.surface.read())
            .finish_non_exhaustive()
    }
}

/// Builder for RemoteContext
pub struct RemoteContextBuilder {
    reader: Arc<dyn ReadMemory>,
    frames: Option<FrameCounter>,
    clock: Option<Arc<dyn Clock>>,
    config: Option<ContextConfig>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    ui_root: Address,
    surface: SurfaceSize,
    roots: UiRoots,
}

impl RemoteContextBuilder {
    fn new(reader: Arc<dyn ReadMemory>) -> Self {
        Self {
            reader,
            frames: None,
            clock: None,
            config: None,
            sink: None,
            ui_root: Address::NULL,
            surface: SurfaceSize::default(),
            roots: UiRoots::new(),
        }
    }

    /// Use a private frame counter instead of the global one
    pub fn frames(mut self, frames: FrameCounter) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn ui_root(mut self, address: impl Into<Address>) -> Self {
        self.ui_root = address.into();
        self
    }

    pub fn surface(mut self, surface: SurfaceSize) -> Self {
        self.surface = surface;
        self
    }

    pub fn roots(mut self, roots: UiRoots) -> Self {
        self.roots = roots;
        self
    }

    pub fn build(self) -> RemoteContext {
        RemoteContext {
            inner: Arc::new(ContextInner {
                reader: self.reader,
                frames: self.frames.unwrap_or_else(FrameCounter::global),
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                config: self.config.unwrap_or_default(),
                sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
                registry: ObjectRegistry::new(),
                ui_root: RwLock::new(self.ui_root),
                surface: RwLock::new(self.surface),
                roots: RwLock::new(self.roots),
            }),
        }
    }
}
