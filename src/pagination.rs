use serde::{Deserialize, Serialize};

fn default_page() -> i64 {
    1
}
fn default_size() -> i64 {
    10
}

/// Common query parameters for paginated listings.
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

impl PageParams {
    pub fn offset(&self) -> i64 {
        if self.page > 0 {
            (self.page - 1) * self.size
        } else {
            0
        }
    }

    /// Resolves the ORDER BY clause against a per-repo whitelist. Sort input
    /// is never interpolated into SQL directly.
    pub fn order_by(
        &self,
        allowed: &[(&str, &str)],
        default: &str,
        default_direction: &str,
    ) -> String {
        let column = self
            .sort
            .as_deref()
            .and_then(|s| allowed.iter().find(|(name, _)| *name == s))
            .map(|(_, col)| *col)
            .unwrap_or(default);
        let direction = match self.direction.as_deref() {
            Some(d) if d.eq_ignore_ascii_case("desc") => "DESC",
            Some(_) => "ASC",
            None => default_direction,
        };
        format!("{column} {direction}")
    }
}

/// Page envelope returned by every listing endpoint.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub number_of_elements: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub is_last: bool,
    pub is_first: bool,
    pub is_empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if size > 0 {
            (total_elements + size - 1) / size
        } else {
            1
        };
        let number_of_elements = content.len() as i64;
        Self {
            is_last: page >= total_pages,
            is_first: page <= 1,
            is_empty: content.is_empty(),
            content,
            page,
            size,
            number_of_elements,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: i64, size: i64) -> PageParams {
        PageParams {
            page,
            size,
            sort: None,
            direction: None,
        }
    }

    #[test]
    fn offset_math() {
        assert_eq!(params(1, 10).offset(), 0);
        assert_eq!(params(3, 10).offset(), 20);
        assert_eq!(params(0, 10).offset(), 0);
    }

    #[test]
    fn envelope_flags() {
        let page = Page::new(vec![1, 2, 3], 1, 10, 3);
        assert_eq!(page.total_pages, 1);
        assert!(page.is_first && page.is_last && !page.is_empty);
        assert_eq!(page.number_of_elements, 3);

        let middle = Page::new(vec![1, 2], 2, 2, 5);
        assert_eq!(middle.total_pages, 3);
        assert!(!middle.is_first && !middle.is_last);

        let empty: Page<i32> = Page::new(vec![], 1, 10, 0);
        assert!(empty.is_empty && empty.is_first && empty.is_last);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn order_by_whitelists_sort_columns() {
        let allowed = [("nama", "p.nama"), ("harga", "p.harga")];
        let mut p = params(1, 10);
        p.sort = Some("harga".into());
        p.direction = Some("desc".into());
        assert_eq!(p.order_by(&allowed, "p.id", "ASC"), "p.harga DESC");

        p.sort = Some("id; DROP TABLE paket".into());
        p.direction = None;
        assert_eq!(p.order_by(&allowed, "p.id", "ASC"), "p.id ASC");
        assert_eq!(p.order_by(&allowed, "p.id", "DESC"), "p.id DESC");
    }
}
