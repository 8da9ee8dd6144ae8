use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: u64 = 10;

/// A page number as requested by a caller, before it is checked against
/// the size of the result set. Anything that isn't an integer reads as
/// page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PageRequest(Option<i64>);

impl PageRequest {
    pub fn first() -> Self {
        Self(None)
    }

    pub fn number(n: i64) -> Self {
        Self(Some(n))
    }

    pub fn parse(raw: Option<&str>) -> Self {
        Self(raw.and_then(|s| s.trim().parse::<i64>().ok()))
    }

    /// Out-of-range numbers (zero and negatives included) land on the
    /// last page. An empty result still has a single empty page.
    pub fn resolve(self, total: u64) -> PageWindow {
        let num_pages = total.div_ceil(PAGE_SIZE).max(1);
        let number = match self.0 {
            None => 1,
            Some(n) if n >= 1 && (n as u64) <= num_pages => n as u64,
            Some(_) => num_pages,
        };

        PageWindow {
            number,
            num_pages,
            offset: (number - 1) * PAGE_SIZE,
            limit: PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: u64) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total,
            has_next: window.number < window.num_pages,
            has_previous: window.number > 1,
        }
    }
}
