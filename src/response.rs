use serde::Serialize;
use utoipa::ToSchema;

/// Pagination details for list responses. Single resources carry an empty
/// meta; unpaginated lists only report `total`.
#[derive(Debug, Serialize, ToSchema, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
    pub total_pages: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
            total_pages: Some(total_pages),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A complete, unpaginated list.
    pub fn all(total: usize) -> Self {
        Self {
            total: Some(total as i64),
            ..Self::default()
        }
    }

    pub fn has_more(&self) -> bool {
        matches!((self.page, self.total_pages), (Some(page), Some(pages)) if page < pages)
    }
}

/// Envelope shared by every endpoint, including errors (where `data` holds
/// the error code and text).
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn single(message: impl Into<String>, data: T) -> Self {
        Self::success(message, data, Some(Meta::empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        let meta = Meta::new(1, 20, 41);
        assert_eq!(meta.total_pages, Some(3));
        assert!(meta.has_more());
        assert!(!Meta::new(3, 20, 41).has_more());
        assert_eq!(Meta::new(1, 20, 0).total_pages, Some(0));
    }

    #[test]
    fn unpaginated_list_reports_total_only() {
        let meta = Meta::all(4);
        assert_eq!(meta.total, Some(4));
        assert_eq!(meta.page, None);
        assert!(!meta.has_more());
    }
}
