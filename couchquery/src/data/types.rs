//! Result types shared by executor operations

use serde::Serialize;

use crate::data::n1ql::PageRequest;

/// Page metadata, derived from the request and the total match count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// 0-based page index
    pub page: u64,
    pub size: u32,
    pub offset: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(request: &PageRequest, total_elements: u64) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(request.size))
        };
        Self {
            page: request.page_number(),
            size: request.size,
            offset: request.offset,
            total_elements,
            total_pages,
        }
    }
}

/// One page of records plus the total count across all pages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            meta: PageMeta::new(request, total_elements),
        }
    }

    pub fn has_next(&self) -> bool {
        self.meta.offset + (self.content.len() as u64) < self.meta.total_elements
    }
}
