//! Page window arithmetic for list endpoints.
//!
//! Nothing here is stateful: a window is recomputed from the caller's page
//! request and the current total on every call.

/// Page size used when the caller does not send one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Hard upper bound for a page.
pub const MAX_PAGE_SIZE: u64 = 50;

/// Page request as received from the caller.
///
/// Values are untrusted; [`PaginationPolicy::compute_window`] floors and
/// clamps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number,
            page_size: Some(page_size),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: None,
        }
    }
}

/// Bounded slice of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Effective 1-based page number
    pub page: u64,
    pub offset: u64,
    pub limit: u64,
    /// `ceil(total_count / limit)`, informational only
    pub page_count: u64,
    pub total_count: u64,
}

impl PageWindow {
    /// The window lies past the end of the result set.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.total_count
    }
}

/// Window computation with configurable defaults.
#[derive(Debug, Clone, Copy)]
pub struct PaginationPolicy {
    default_page_size: u64,
    max_page_size: u64,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }
}

impl PaginationPolicy {
    /// A `max_page_size` of zero is raised to one, and the default is kept
    /// inside `[1, max_page_size]`.
    pub fn new(default_page_size: u64, max_page_size: u64) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    pub fn default_page_size(&self) -> u64 {
        self.default_page_size
    }

    /// Effective limit for a requested page size.
    pub fn limit_for(&self, requested: Option<i64>) -> u64 {
        match requested {
            None => self.default_page_size,
            Some(size) if size < 1 => 1,
            Some(size) => (size as u64).min(self.max_page_size),
        }
    }

    pub fn compute_window(&self, request: &PageRequest, total_count: u64) -> PageWindow {
        let page = request.page_number.max(1) as u64;
        let limit = self.limit_for(request.page_size);
        let offset = (page - 1).saturating_mul(limit);

        PageWindow {
            page,
            offset,
            limit,
            page_count: total_count.div_ceil(limit),
            total_count,
        }
    }
}

/// One page of items plus the unpaginated total they were cut from.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    pub fn empty(total_count: u64) -> Self {
        Self {
            items: Vec::new(),
            total_count,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }
}
