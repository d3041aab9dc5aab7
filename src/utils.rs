use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Number of posts on every paginated list.
pub const POSTS_PER_PAGE: i64 = 10;

/// The `page` query parameter. Kept as a raw string so junk values fall back
/// to the first page instead of rejecting the request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageParams {
    page: Option<String>,
}

impl PageParams {
    pub fn new(page: Option<&str>) -> Self {
        Self {
            page: page.map(str::to_owned),
        }
    }

    /// Reads `page` out of a raw query string. When the parameter repeats,
    /// the last value wins.
    pub fn from_query(query: Option<&str>) -> Self {
        let page = query.and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(key, _)| key == "page")
                .last()
                .map(|(_, value)| value.into_owned())
        });
        Self { page }
    }

    /// Requested 1-indexed page. Absent or non-numeric means 1; numbers below
    /// 1 are kept so the window can clamp them.
    pub fn requested(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PageParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PageParams::from_query(parts.uri.query()))
    }
}

/// Resolved position of one page inside a collection of `count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
}

impl PageWindow {
    /// Clamps `requested` into `1..=num_pages`. An empty collection still
    /// has one (empty) page.
    pub fn new(requested: i64, count: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let count = count.max(0);
        let num_pages = ((count + per_page - 1) / per_page).max(1);
        let number = requested.clamp(1, num_pages);
        Self {
            number,
            num_pages,
            count,
            per_page,
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

/// One page of an ordered collection plus paginator metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, window: PageWindow) -> Self {
        Self {
            object_list,
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_previous: window.number > 1,
            has_next: window.number < window.num_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            object_list: self.object_list.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}
