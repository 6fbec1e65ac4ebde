//! Pagination cursor and grouped page buttons

use crate::models::Page;

/// Page buttons shown at once
pub const PAGE_GROUP_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 0,
            page_size,
            total_pages: 0,
            total_elements: 0,
        }
    }

    /// Cursor for a server response; the page index is clamped into range.
    pub fn from_page<T>(page: &Page<T>, page_size: u32) -> Self {
        Self {
            page: page.number.min(page.total_pages.saturating_sub(1)),
            page_size,
            total_pages: page.total_pages,
            total_elements: page.total_elements,
        }
    }

    /// Whether `page` names an existing page. Negative and past-the-end pages don't.
    pub fn contains(&self, page: i64) -> bool {
        page >= 0 && page < i64::from(self.total_pages)
    }

    pub fn group(&self) -> PageGroup {
        PageGroup::around(self.page, self.total_pages)
    }
}

/// The run of page buttons containing the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGroup {
    /// First page in the group (0-based)
    pub first: u32,
    /// One past the last page in the group
    pub end: u32,
    total_pages: u32,
}

impl PageGroup {
    pub fn around(page: u32, total_pages: u32) -> Self {
        let first = (page / PAGE_GROUP_SIZE) * PAGE_GROUP_SIZE;
        let end = (first + PAGE_GROUP_SIZE).min(total_pages);
        Self {
            first: first.min(end),
            end,
            total_pages,
        }
    }

    pub fn pages(&self) -> std::ops::Range<u32> {
        self.first..self.end
    }

    /// First page of the previous group, if any
    pub fn previous(&self) -> Option<u32> {
        self.first.checked_sub(PAGE_GROUP_SIZE)
    }

    /// First page of the next group, if any
    pub fn next(&self) -> Option<u32> {
        let next = self.first + PAGE_GROUP_SIZE;
        (next < self.total_pages).then_some(next)
    }
}
