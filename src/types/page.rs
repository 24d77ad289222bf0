use serde::{Deserialize, Serialize};

/// One page of a json-server style paginated listing.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    /// json-server leaves this out; the gateway fills in the requested page.
    #[serde(default)]
    pub page: u32,
    pub pages: u32,
    pub items: u32,
    pub first: u32,
    pub last: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

impl<T> Paginated<T> {
    pub fn with_requested_page(mut self, requested: u32) -> Self {
        if self.page == 0 {
            self.page = requested;
        }
        self
    }

    /// Check `first <= page <= last` and `pages == ceil(items / per_page)`.
    pub fn check_invariants(&self, per_page: u32) -> Result<(), String> {
        if per_page == 0 {
            return Err("per_page must be positive".to_string());
        }

        let expected_pages = self.items.div_ceil(per_page);
        if self.pages != expected_pages {
            return Err(format!(
                "pages = {} but ceil({} / {}) = {}",
                self.pages, self.items, per_page, expected_pages
            ));
        }

        if self.items > 0 && !(self.first <= self.page && self.page <= self.last) {
            return Err(format!(
                "page {} outside [{}, {}]",
                self.page, self.first, self.last
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u32, items: u32, pages: u32) -> Paginated<u32> {
        Paginated {
            data: vec![],
            page,
            pages,
            items,
            first: 1,
            last: pages.max(1),
            next: None,
            prev: None,
        }
    }

    #[test]
    fn test_json_server_envelope() {
        let parsed: Paginated<serde_json::Value> = serde_json::from_str(
            r#"{"first":1,"prev":null,"next":2,"last":3,"pages":3,"items":25,"data":[]}"#,
        )
        .unwrap();
        assert_eq!(parsed.page, 0);
        assert_eq!(parsed.next, Some(2));
        assert_eq!(parsed.prev, None);

        let filled = parsed.with_requested_page(1);
        assert_eq!(filled.page, 1);
        assert!(filled.check_invariants(10).is_ok());
    }

    #[test]
    fn test_server_page_wins_over_requested() {
        assert_eq!(page(2, 25, 3).with_requested_page(7).page, 2);
    }

    #[test]
    fn test_invariant_violations() {
        assert!(page(2, 25, 2).check_invariants(10).is_err());
        assert!(page(5, 25, 3).check_invariants(10).is_err());
        assert!(page(1, 25, 3).check_invariants(0).is_err());
    }

    #[test]
    fn test_empty_listing_is_consistent() {
        let mut empty = page(1, 0, 0);
        empty.last = 0;
        assert!(empty.check_invariants(10).is_ok());
    }
}
