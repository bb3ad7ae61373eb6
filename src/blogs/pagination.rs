use serde::{Deserialize, Serialize};

use crate::{app::AppError, config::PaginationConfig};

/// `?page=&page_size=` as sent by the client.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// A validated page: 1-based number and a size within the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(query: &PageQuery, config: &PaginationConfig) -> Result<Self, AppError> {
        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::NotFound);
        }
        let page_size = match query.page_size {
            None | Some(0) => config.default_page_size,
            Some(size) => size.min(config.max_page_size),
        };

        Ok(Self { page, page_size })
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Pages past the end are not found; the first page always exists, even empty.
    pub fn check_in_range(&self, count: i64) -> Result<(), AppError> {
        if self.page > 1 && self.offset() >= count {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

/// One page of results before it is tied to a URL.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    pub count: i64,
    pub request: PageRequest,
}

impl<T> Paginated<T> {
    pub fn into_page(self, path: &str) -> Page<T> {
        let PageRequest { page, page_size } = self.request;
        let link = |page: u32| format!("{path}?page={page}&page_size={page_size}");

        let seen = self.request.offset() + self.results.len() as i64;
        Page {
            count: self.count,
            next: (seen < self.count).then(|| link(page + 1)),
            previous: (page > 1).then(|| link(page - 1)),
            results: self.results,
        }
    }
}

/// Response envelope for every paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn request(page: Option<u32>, page_size: Option<u32>) -> Result<PageRequest, AppError> {
        PageRequest::new(&PageQuery { page, page_size }, &PaginationConfig::default())
    }

    #[test]
    fn sizes_default_and_clamp() {
        let expected = PageRequest {
            page: 1,
            page_size: 10,
        };
        assert_eq!(request(None, None).unwrap(), expected);
        assert_eq!(request(Some(3), Some(0)).unwrap().page_size, 10);
        assert_eq!(request(None, Some(500)).unwrap().page_size, 100);
        assert!(matches!(request(Some(0), None), Err(AppError::NotFound)));
    }

    #[test]
    fn offsets_and_range() {
        let third = request(Some(3), Some(5)).unwrap();
        assert_eq!(third.offset(), 10);
        assert_eq!(third.limit(), 5);
        assert!(third.check_in_range(11).is_ok());
        assert!(third.check_in_range(10).is_err());

        let first = request(None, None).unwrap();
        assert!(first.check_in_range(0).is_ok());
    }

    #[test]
    fn links_point_at_neighbouring_pages() {
        let page = Paginated {
            results: vec![1, 2],
            count: 5,
            request: request(Some(2), Some(2)).unwrap(),
        }
        .into_page("/blogs");

        assert_eq!(page.next.as_deref(), Some("/blogs?page=3&page_size=2"));
        assert_eq!(page.previous.as_deref(), Some("/blogs?page=1&page_size=2"));

        let last = Paginated {
            results: vec![5],
            count: 5,
            request: request(Some(3), Some(2)).unwrap(),
        }
        .into_page("/blogs");
        assert!(last.next.is_none());
    }
}
