/// Page-number pagination
///
/// Responses look like:
///
/// ```json
/// { "count": 14, "next": "http://host/api/recipes/?page=3", "previous": "http://host/api/recipes/", "results": [] }
/// ```
///
/// `page` starts at 1. `limit` overrides the page size, capped at
/// [`MAX_PAGE_SIZE`]. A page number below 1, unparsable, or past the last
/// page is a 404 (page 1 of an empty list is valid).

use serde::Serialize;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::params::QueryParams;

/// Page size when `limit` is absent
pub const DEFAULT_PAGE_SIZE: i64 = 6;

/// Largest accepted `limit`
pub const MAX_PAGE_SIZE: i64 = 100;

/// Requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

fn invalid_page() -> ApiError {
    ApiError::NotFound("Invalid page".to_string())
}

impl PageRequest {
    /// Reads `page` and `limit` from the query
    ///
    /// # Errors
    ///
    /// `NotFound` if `page` is present but not a positive integer.
    pub fn from_params(params: &QueryParams) -> ApiResult<Self> {
        let page = match params.get("page") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(invalid_page)?,
            None => 1,
        };

        let limit = params
            .get_i64("limit")
            .filter(|limit| *limit >= 1)
            .map(|limit| limit.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self { page, limit })
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Rejects pages past the end of a `count`-row list
    ///
    /// # Errors
    ///
    /// `NotFound` if the page starts beyond the last row.
    pub fn ensure_within(&self, count: i64) -> ApiResult<()> {
        if self.page > 1 && self.offset() >= count {
            return Err(invalid_page());
        }
        Ok(())
    }
}

/// One page of results with navigation links
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

fn link_to(base: &Url, page: i64) -> String {
    let mut url = base.clone();
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_query(None);
    if !kept.is_empty() || page > 1 {
        let mut query = url.query_pairs_mut();
        for (k, v) in &kept {
            query.append_pair(k, v);
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }

    url.to_string()
}

impl<T> Page<T> {
    /// Builds a page, deriving links from the absolute request URL
    pub fn new(results: Vec<T>, count: i64, request: PageRequest, url: &Url) -> Self {
        let next = (request.page.saturating_mul(request.limit) < count)
            .then(|| link_to(url, request.page + 1));
        let previous = (request.page > 1).then(|| link_to(url, request.page - 1));

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> ApiResult<PageRequest> {
        PageRequest::from_params(&QueryParams::parse(Some(query)))
    }

    #[test]
    fn test_defaults() {
        let req = request("").unwrap();
        assert_eq!(req, PageRequest { page: 1, limit: DEFAULT_PAGE_SIZE });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_limit_is_capped_and_invalid_limit_ignored() {
        assert_eq!(request("limit=1000").unwrap().limit, MAX_PAGE_SIZE);
        assert_eq!(request("limit=0").unwrap().limit, DEFAULT_PAGE_SIZE);
        assert_eq!(request("limit=abc").unwrap().limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_invalid_page_numbers() {
        assert!(matches!(request("page=0"), Err(ApiError::NotFound(_))));
        assert!(matches!(request("page=-2"), Err(ApiError::NotFound(_))));
        assert!(matches!(request("page=last"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_page_past_the_end() {
        let req = request("page=3&limit=5").unwrap();
        assert_eq!(req.offset(), 10);
        assert!(req.ensure_within(11).is_ok());
        assert!(req.ensure_within(10).is_err());

        // First page of an empty list is fine
        assert!(request("").unwrap().ensure_within(0).is_ok());
    }

    #[test]
    fn test_links() {
        let url = Url::parse("http://localhost:8080/api/recipes/?tags=lunch&page=2&limit=2").unwrap();
        let req = request("page=2&limit=2").unwrap();
        let page = Page::new(vec![1, 2], 5, req, &url);

        assert_eq!(
            page.next.as_deref(),
            Some("http://localhost:8080/api/recipes/?tags=lunch&limit=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://localhost:8080/api/recipes/?tags=lunch&limit=2")
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let url = Url::parse("http://localhost:8080/api/users/?page=2").unwrap();
        let req = request("page=2").unwrap();
        let page = Page::new(vec![7], 7, req, &url);

        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("http://localhost:8080/api/users/"));
    }
}
