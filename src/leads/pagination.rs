//! Limit/offset paging with next/previous links.

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    /// Values that don't parse, or are out of range, fall back to defaults.
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);
        let offset = offset
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .unwrap_or(0);
        Page { limit, offset }
    }

    /// Absolute links to the neighbouring pages. `query` is the raw request
    /// query string; its other parameters are carried over unchanged.
    pub fn links(&self, base_url: &str, path: &str, query: Option<&str>, count: i64) -> PageLinks {
        let next_offset = self.offset.saturating_add(self.limit);
        let next = (next_offset < count)
            .then(|| page_url(base_url, path, query, self.limit, Some(next_offset)));

        let previous = if self.offset <= 0 {
            None
        } else if self.offset - self.limit <= 0 {
            Some(page_url(base_url, path, query, self.limit, None))
        } else {
            Some(page_url(
                base_url,
                path,
                query,
                self.limit,
                Some(self.offset - self.limit),
            ))
        };

        PageLinks { next, previous }
    }
}

fn page_url(base_url: &str, path: &str, query: Option<&str>, limit: i64, offset: Option<i64>) -> String {
    let mut pairs: Vec<(String, String)> = query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .filter(|(key, _)| key != "limit" && key != "offset")
                .collect()
        })
        .unwrap_or_default();

    pairs.push(("limit".to_string(), limit.to_string()));
    if let Some(offset) = offset {
        pairs.push(("offset".to_string(), offset.to_string()));
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{}{path}?{query}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://crm.test/";

    #[test]
    fn defaults_apply_to_missing_or_bad_values() {
        assert_eq!(Page::parse(None, None), Page::default());
        assert_eq!(Page::parse(Some("ten"), Some("-3")), Page::default());
        assert_eq!(Page::parse(Some("0"), Some("")), Page::default());
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(Page::parse(Some("5000"), Some("20")), Page { limit: MAX_LIMIT, offset: 20 });
        assert_eq!(Page::parse(Some(" 25 "), None), Page { limit: 25, offset: 0 });
    }

    #[test]
    fn first_page_has_only_next() {
        let links = Page { limit: 10, offset: 0 }.links(BASE, "/api/leads/projects/", None, 25);
        assert_eq!(
            links.next.as_deref(),
            Some("http://crm.test/api/leads/projects/?limit=10&offset=10")
        );
        assert_eq!(links.previous, None);
    }

    #[test]
    fn last_page_has_only_previous() {
        let links = Page { limit: 10, offset: 20 }.links(BASE, "/p/", None, 25);
        assert_eq!(links.next, None);
        assert_eq!(links.previous.as_deref(), Some("http://crm.test/p/?limit=10&offset=10"));
    }

    #[test]
    fn previous_to_first_page_drops_offset() {
        let links = Page { limit: 10, offset: 5 }.links(BASE, "/p/", None, 25);
        assert_eq!(links.previous.as_deref(), Some("http://crm.test/p/?limit=10"));
    }

    #[test]
    fn filters_are_carried_over() {
        let links = Page { limit: 2, offset: 0 }.links(
            BASE,
            "/p/",
            Some("name=acme+corp&limit=99&offset=4&status=closed"),
            3,
        );
        assert_eq!(
            links.next.as_deref(),
            Some("http://crm.test/p/?name=acme+corp&status=closed&limit=2&offset=2")
        );
    }

    #[test]
    fn exact_fit_has_no_next() {
        let links = Page { limit: 5, offset: 5 }.links(BASE, "/p/", None, 10);
        assert_eq!(links.next, None);
    }

    #[test]
    fn huge_offset_does_not_overflow() {
        let page = Page::parse(Some("10"), Some(&i64::MAX.to_string()));
        assert_eq!(page.offset, i64::MAX);

        let links = page.links(BASE, "/p/", None, 25);
        assert_eq!(links.next, None);
        assert_eq!(
            links.previous,
            Some(format!("http://crm.test/p/?limit=10&offset={}", i64::MAX - 10))
        );
    }
}
