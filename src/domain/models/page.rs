//! Offset pagination over in-memory lists.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{SchedulerError, SchedulerResult};

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    /// Create a page request. `size` must be at least 1.
    pub fn new(page: usize, size: usize) -> SchedulerResult<Self> {
        if size == 0 {
            return Err(SchedulerError::InvalidPageRequest { page, size });
        }
        Ok(Self { page, size })
    }

    /// Index of the first element on this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

/// One page of a sorted result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Cut `page` out of an already sorted list.
///
/// Pages past the end are empty; `total_elements` always reflects the full list.
pub fn paginate<T>(sorted: Vec<T>, page: PageRequest) -> Page<T> {
    let total_elements = sorted.len();
    let size = page.size.max(1);
    let total_pages = total_elements.div_ceil(size);

    let items = sorted
        .into_iter()
        .skip(page.offset())
        .take(size)
        .collect();

    Page {
        items,
        page: page.page,
        size,
        total_elements,
        total_pages,
    }
}
