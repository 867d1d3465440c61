//! Per-kind pagination state machine.

/// Pagination state for one resource kind.
///
/// Each kind moves `Idle` -> `Fetching` -> `Idle` (page appended) or
/// `Exhausted` (empty page, terminal). [`PageState::begin_fetch`] is
/// the only way to enter `Fetching`, so at most one request per kind
/// is ever in flight and pages are applied strictly in order.
#[derive(Debug)]
pub struct PageState<T> {
    next_page: u32,
    in_flight: bool,
    exhausted: bool,
    items: Vec<T>,
    error: Option<String>,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self {
            next_page: 1,
            in_flight: false,
            exhausted: false,
            items: Vec::new(),
            error: None,
        }
    }
}

impl<T> PageState<T> {
    /// Try to start a fetch. Returns the page to request, or `None`
    /// when a request is already in flight or the kind is exhausted.
    pub fn begin_fetch(&mut self) -> Option<u32> {
        if self.in_flight || self.exhausted {
            return None;
        }
        self.in_flight = true;
        Some(self.next_page)
    }

    /// Apply a successfully fetched page. An empty page marks the kind
    /// exhausted; a non-empty page is appended in arrival order and
    /// advances the cursor.
    pub fn finish_page(&mut self, page_items: Vec<T>) {
        self.in_flight = false;
        self.error = None;
        if page_items.is_empty() {
            self.exhausted = true;
        } else {
            self.items.extend(page_items);
            self.next_page += 1;
        }
    }

    /// Record a failed fetch. The cursor is left untouched so the next
    /// trigger retries the same page.
    pub fn finish_error(&mut self, message: String) {
        self.in_flight = false;
        self.error = Some(message);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True when `selected` has come within `threshold` cards of the
    /// end of the accumulated list. This is the load-more trigger.
    pub fn near_end(&self, selected: usize, threshold: usize) -> bool {
        selected + threshold >= self.items.len()
    }
}
