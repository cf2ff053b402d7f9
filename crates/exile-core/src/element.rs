//! UI element tree
//!
//! An [`Element`] is a handle to the UI node at an address. Its raw header is
//! re-read at most once per frame; everything else (children, visibility,
//! geometry) is projected from headers along the tree. The tree itself is
//! foreign memory that may be torn, reused or cyclic at any moment, so every
//! walk here carries a visited set and a depth limit, and every failure
//! degrades to the null sentinel instead of an error.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::CachedValue;
use crate::context::RemoteContext;
use crate::geometry::{ColorBgra, Rect, Vec2};
use crate::memory::POINTER_SIZE;
use crate::memory::layout::{ElementOffsets, element};
use crate::object::{Address, RemoteObject};

/// Four no-break spaces mark an inline icon in label text
const ICON_PLACEHOLDER: &str = "\u{A0}\u{A0}\u{A0}\u{A0}";

/// Handle to a UI element in the target process
///
/// Clones share caches. Equality is address equality.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

struct ElementInner {
    ctx: RemoteContext,
    address: Address,
    elem: CachedValue<ElementOffsets>,
    text: CachedValue<String>,
    long_text: CachedValue<String>,
    client_rect: CachedValue<Rect>,
    children: Mutex<ChildCache>,
    parent: Mutex<Option<ParentLink>>,
}

/// Child addresses only; handles come from the registry so a cyclic child
/// graph in foreign memory never forms an `Arc` cycle
#[derive(Default)]
struct ChildCache {
    hash: Option<u64>,
    addresses: Arc<[Address]>,
}

struct ParentLink {
    address: Address,
    element: Weak<ElementInner>,
}

impl ElementInner {
    fn new(ctx: &RemoteContext, address: Address, this: &Weak<ElementInner>) -> Self {
        let frames = ctx.frames().clone();

        let reader = ctx.clone();
        let elem = CachedValue::frame(frames.clone(), move || reader.read(address));

        let reader = ctx.clone();
        let text = CachedValue::frame(frames.clone(), move || {
            read_label(&reader, address, element::TEXT)
        });

        let reader = ctx.clone();
        let long_text = CachedValue::frame(frames, move || {
            read_label(&reader, address, element::LONG_TEXT)
        });

        let weak = this.clone();
        let client_rect = CachedValue::time(
            ctx.config().client_rect_window(),
            ctx.clock(),
            move || {
                weak.upgrade()
                    .map(|inner| Element { inner }.client_rect())
                    .unwrap_or_default()
            },
        );

        Self {
            ctx: ctx.clone(),
            address,
            elem,
            text,
            long_text,
            client_rect,
            children: Mutex::new(ChildCache::default()),
            parent: Mutex::new(None),
        }
    }
}

fn read_label(ctx: &RemoteContext, address: Address, offset: u64) -> String {
    if address.is_null() {
        return String::new();
    }
    sanitize(&ctx.read_text(address.offset(offset)))
}

fn sanitize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    text.replace(ICON_PLACEHOLDER, "{{icon}}")
}

fn child_span_hash(elem: &ElementOffsets) -> u64 {
    let mut hasher = DefaultHasher::new();
    (elem.child_start, elem.child_end, elem.child_capacity_end).hash(&mut hasher);
    hasher.finish()
}

fn derived_child_count(elem: &ElementOffsets) -> i64 {
    (elem.child_end as i64).wrapping_sub(elem.child_start as i64) / POINTER_SIZE as i64
}

/// Render an index path with the failing position marked, e.g. `[0] >[4]< [1]`
fn format_index_path(indices: &[usize], failed_at: usize) -> String {
    indices
        .iter()
        .enumerate()
        .map(|(position, index)| {
            if position == failed_at {
                format!(">[{}]<", index)
            } else {
                format!("[{}]", index)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl RemoteObject for Element {
    fn from_address(ctx: &RemoteContext, address: Address) -> Self {
        let make = || Arc::new_cyclic(|this| ElementInner::new(ctx, address, this));
        let inner = if address.is_null() {
            make()
        } else {
            ctx.registry().get_or_insert(address, make)
        };
        Self { inner }
    }

    fn address(&self) -> Address {
        self.inner.address
    }

    fn context(&self) -> &RemoteContext {
        &self.inner.ctx
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// Raw projections
impl Element {
    /// Sentinel bound to address 0
    pub fn null(ctx: &RemoteContext) -> Self {
        ctx.get_object(Address::NULL)
    }

    /// Raw header for the current frame; zeroed when unbound
    ///
    /// Capture this once when several fields must come from the same read.
    pub fn elem(&self) -> ElementOffsets {
        self.inner.elem.value()
    }

    /// Whether the header still describes the element at this address
    pub fn is_valid(&self) -> bool {
        !self.address().is_null() && self.elem().self_pointer == self.address().raw()
    }

    /// Number of children according to the child span
    ///
    /// Untrusted: the span may be torn or garbage.
    pub fn child_count(&self) -> i64 {
        derived_child_count(&self.elem())
    }

    pub fn is_visible_local(&self) -> bool {
        self.elem().is_visible_local & element::VISIBLE_FLAG == element::VISIBLE_FLAG
    }

    pub fn is_highlighted(&self) -> bool {
        self.elem().is_highlighted != 0
    }

    pub fn position(&self) -> Vec2 {
        let elem = self.elem();
        Vec2::new(elem.x, elem.y)
    }

    pub fn x(&self) -> f32 {
        self.elem().x
    }

    pub fn y(&self) -> f32 {
        self.elem().y
    }

    pub fn scale(&self) -> f32 {
        self.elem().scale
    }

    pub fn width(&self) -> f32 {
        self.elem().width
    }

    pub fn height(&self) -> f32 {
        self.elem().height
    }

    pub fn border_color(&self) -> ColorBgra {
        self.elem().border_color.into()
    }

    pub fn background_color(&self) -> ColorBgra {
        self.elem().background_color.into()
    }

    pub fn overlay_color(&self) -> ColorBgra {
        self.elem().overlay_color.into()
    }

    pub fn text_box_border_color(&self) -> ColorBgra {
        self.elem().text_box_border_color.into()
    }

    pub fn text_box_background_color(&self) -> ColorBgra {
        self.elem().text_box_background_color.into()
    }

    pub fn text_box_overlay_color(&self) -> ColorBgra {
        self.elem().text_box_overlay_color.into()
    }

    pub fn highlight_border_color(&self) -> ColorBgra {
        self.elem().highlight_border_color.into()
    }

    /// Label text, empty when blank; icons become `{{icon}}`
    pub fn text(&self) -> String {
        self.inner.text.value()
    }

    pub fn long_text(&self) -> String {
        self.inner.long_text.value()
    }

    /// Tooltip element, or the sentinel
    pub fn tooltip(&self) -> Element {
        if self.address().is_null() {
            return self.clone();
        }
        self.get_object(self.elem().tooltip)
    }
}

// Tree navigation
impl Element {
    pub fn root(&self) -> Element {
        self.context().ui_root()
    }

    /// Parent element, resolved once per instance
    pub fn parent(&self) -> Option<Element> {
        let parent_address = Address::new(self.elem().parent);
        if parent_address.is_null() {
            return None;
        }

        {
            let link = self.inner.parent.lock();
            if let Some(link) = link.as_ref() {
                if let Some(inner) = link.element.upgrade() {
                    return Some(Element { inner });
                }
            }
        }

        let memo_address = self
            .inner
            .parent
            .lock()
            .as_ref()
            .map(|link| link.address)
            .unwrap_or(parent_address);
        let parent: Element = self.get_object(memo_address);
        *self.inner.parent.lock() = Some(ParentLink {
            address: memo_address,
            element: Arc::downgrade(&parent.inner),
        });
        Some(parent)
    }

    /// Ancestors from the nearest parent up to, not including, the UI root
    ///
    /// Stops at a null parent, the root, a repeated address or the depth limit.
    /// The element itself counts as visited, so in an `A -> B -> A` cycle the
    /// chain of `A` is `[B]`.
    pub fn parent_chain(&self) -> Vec<Element> {
        let mut chain = Vec::new();
        if self.address().is_null() {
            return chain;
        }

        let root = self.root().address();
        let max_depth = self.context().config().max_parent_depth;
        let mut visited = HashSet::from([self.address()]);
        let mut current = self.parent();

        while let Some(parent) = current {
            let address = parent.address();
            if address.is_null() || address == root || !visited.insert(address) {
                break;
            }
            if chain.len() >= max_depth {
                warn!(
                    "Parent chain of {} exceeds {} levels, truncating",
                    self.address(),
                    max_depth
                );
                break;
            }
            current = parent.parent();
            chain.push(parent);
        }

        chain
    }

    /// Hash of the raw child span, used to detect child list changes
    pub fn child_hash(&self) -> u64 {
        child_span_hash(&self.elem())
    }

    /// Current children, re-read only when the child span changes
    ///
    /// A rebuild is accepted only when the number of pointers read matches the
    /// span; otherwise the previous list is kept and the rebuild is retried on
    /// the next call.
    pub fn children(&self) -> Vec<Element> {
        self.child_addresses()
            .iter()
            .map(|&address| self.get_object(address))
            .collect()
    }

    fn child_addresses(&self) -> Arc<[Address]> {
        let elem = self.elem();
        let count = derived_child_count(&elem);
        let hash = child_span_hash(&elem);

        {
            let cache = self.inner.children.lock();
            if self.address().is_null()
                || elem.child_start == 0
                || elem.child_end == 0
                || count < 0
                || cache.hash == Some(hash)
            {
                return Arc::clone(&cache.addresses);
            }
        }

        let Some(pointers) = self.read_child_pointers(&elem) else {
            return Arc::clone(&self.inner.children.lock().addresses);
        };

        let addresses: Arc<[Address]> = pointers.into();
        let mut cache = self.inner.children.lock();
        cache.hash = Some(hash);
        cache.addresses = Arc::clone(&addresses);
        debug!("Rebuilt {} children of {}", addresses.len(), self.address());
        addresses
    }

    /// Children wrapped as `T`, read fresh on every call
    ///
    /// Empty when the child span cannot be read consistently.
    pub fn children_as<T: RemoteObject>(&self) -> Vec<T> {
        let elem = self.elem();
        if self.address().is_null() || elem.child_start == 0 || elem.child_end == 0 {
            return Vec::new();
        }
        self.read_child_pointers(&elem)
            .map(|pointers| pointers.into_iter().map(|a| self.get_object(a)).collect())
            .unwrap_or_default()
    }

    fn read_child_pointers(&self, elem: &ElementOffsets) -> Option<Vec<Address>> {
        let count = derived_child_count(elem);
        if count < 0 {
            return None;
        }
        if count as usize > self.context().config().max_child_count {
            warn!(
                "Child span of {} claims {} children, ignoring",
                self.address(),
                count
            );
            return None;
        }

        let pointers = self.context().read_pointer_array(
            Address::new(elem.child_start),
            Address::new(elem.child_end),
        );
        if pointers.len() as i64 != count {
            debug!(
                "Child read of {} returned {} of {} pointers, keeping previous list",
                self.address(),
                pointers.len(),
                count
            );
            return None;
        }
        Some(pointers)
    }

    fn checked_child_at(&self, index: usize) -> Option<Element> {
        let elem = self.elem();
        let count = derived_child_count(&elem);
        if elem.child_start == 0 || i64::try_from(index).map_or(true, |i| i >= count) {
            return None;
        }
        let offset = (index as u64).checked_mul(POINTER_SIZE)?;
        let slot = Address::new(elem.child_start).offset(offset);
        let pointer: u64 = self.context().read(slot);
        Some(self.get_object(pointer))
    }

    /// Child at `index`, or the sentinel when out of range
    pub fn child_at(&self, index: usize) -> Element {
        self.checked_child_at(index)
            .unwrap_or_else(|| Element::null(self.context()))
    }

    /// Position of this element among its parent's children
    pub fn index_in_parent(&self) -> Option<usize> {
        self.parent()?
            .children()
            .iter()
            .position(|child| child.address() == self.address())
    }

    /// Follow `indices` down the tree
    ///
    /// On a missing or null child the full path is reported to the diagnostic
    /// sink with the failing position marked, and the sentinel is returned so
    /// callers can keep chaining.
    pub fn child_from_indices(&self, indices: &[usize]) -> Element {
        let mut current = self.clone();
        for (position, &index) in indices.iter().enumerate() {
            match current.checked_child_at(index) {
                None => {
                    self.context().log_debug(&format!(
                        "Element with index {} was not found. Indices: {}",
                        index,
                        format_index_path(indices, position)
                    ));
                    return Element::null(self.context());
                }
                Some(child) if child.address().is_null() => {
                    self.context().log_debug(&format!(
                        "Element with index {} has address = 0. Indices: {}",
                        index,
                        format_index_path(indices, position)
                    ));
                    return child;
                }
                Some(child) => current = child,
            }
        }
        current
    }

    /// Like [`Element::child_from_indices`] but silent, returning `None` on failure
    pub fn try_child_from_indices(&self, indices: &[usize]) -> Option<Element> {
        let mut current = self.clone();
        for &index in indices {
            current = current.checked_child_at(index)?;
            if current.address().is_null() {
                return None;
            }
        }
        Some(current)
    }

    /// Human-readable path such as `(inventory_panel)3->0->12`
    ///
    /// The name comes from the declared UI roots and is matched against the
    /// second-highest ancestor below the root.
    pub fn path_from_root(&self) -> String {
        let mut chain = self.parent_chain();
        if !chain.is_empty() {
            chain.pop();
            chain.reverse();
        }
        chain.push(self.clone());

        let prefix = self
            .context()
            .roots()
            .name_of(chain[0].address())
            .map(|name| format!("({})", name))
            .unwrap_or_default();

        let indices = chain
            .iter()
            .map(|element| {
                element
                    .index_in_parent()
                    .map(|index| index.to_string())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join("->");

        format!("{}{}", prefix, indices)
    }
}

// Visibility and geometry
impl Element {
    /// Visible only if this element and every ancestor below the root are
    pub fn is_visible(&self) -> bool {
        let raw = self.address().raw();
        if raw == 0 || raw >= self.context().config().invalid_address_floor {
            return false;
        }
        self.is_visible_local() && self.parent_chain().iter().all(Element::is_visible_local)
    }

    fn root_scale(&self) -> f32 {
        let scale = self.root().scale();
        if scale == 0.0 || !scale.is_finite() {
            1.0
        } else {
            scale
        }
    }

    /// Accumulated logical position of all ancestors, in root scale
    pub fn parent_position(&self) -> Vec2 {
        let root_scale = self.root_scale();
        self.parent_chain()
            .iter()
            .fold(Vec2::default(), |acc, ancestor| {
                let elem = ancestor.elem();
                Vec2::new(
                    acc.x + elem.x * elem.scale / root_scale,
                    acc.y + elem.y * elem.scale / root_scale,
                )
            })
    }

    /// Screen-space rectangle, computed now
    pub fn client_rect(&self) -> Rect {
        if self.address().is_null() {
            return Rect::default();
        }

        let surface = self.context().surface_size();
        if surface.width <= 0.0 || surface.height <= 0.0 {
            return Rect::default();
        }

        let config = self.context().config();
        let parent = self.parent_position();
        let ratio_fix = surface.width / surface.height / config.reference_aspect;
        let x_scale = surface.width / config.reference_width / ratio_fix;
        let y_scale = surface.height / config.reference_height;

        let elem = self.elem();
        let relative = elem.scale / self.root_scale();
        Rect::new(
            (parent.x + elem.x * relative) * x_scale,
            (parent.y + elem.y * relative) * y_scale,
            x_scale * elem.width * relative,
            y_scale * elem.height * relative,
        )
    }

    /// Screen-space rectangle, recomputed at most once per cache window
    pub fn client_rect_cached(&self) -> Rect {
        self.inner.client_rect.value()
    }
}

// Whole-tree traversal
impl Element {
    fn walk(
        &self,
        depth: usize,
        visited: &mut HashSet<Address>,
        visit: &mut dyn FnMut(&Element) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        if depth > self.context().config().max_tree_depth || !visited.insert(self.address()) {
            return ControlFlow::Continue(());
        }
        visit(self)?;
        for child in self.children().iter() {
            child.walk(depth + 1, visited, visit)?;
        }
        ControlFlow::Continue(())
    }

    /// Depth-first pre-order visit of this element and its live descendants
    pub fn visit_tree(&self, mut visit: impl FnMut(&Element) -> ControlFlow<()>) {
        let mut visited = HashSet::new();
        let _ = self.walk(0, &mut visited, &mut visit);
    }

    /// Every non-empty label text in the subtree, pre-order
    pub fn all_strings(&self) -> Vec<String> {
        let mut strings = Vec::new();
        self.visit_tree(|element| {
            let text = element.text();
            if !text.is_empty() {
                strings.push(text);
            }
            ControlFlow::Continue(())
        });
        strings
    }

    /// Every element in the subtree with non-empty text, pre-order
    pub fn all_text_elements(&self) -> Vec<Element> {
        let mut elements = Vec::new();
        self.visit_tree(|element| {
            if !element.text().is_empty() {
                elements.push(element.clone());
            }
            ControlFlow::Continue(())
        });
        elements
    }

    /// First element in the subtree whose text equals `text`
    pub fn element_by_string(&self, text: &str) -> Option<Element> {
        let mut found = None;
        self.visit_tree(|element| {
            if element.text() == text {
                found = Some(element.clone());
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        });
        found
    }
}
