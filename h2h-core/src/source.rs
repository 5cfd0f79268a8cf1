/// Boundaries to the outside world: where race pages and category metadata
/// come from. Implementations live with the caller (HTTP client, fixtures).
use crate::error::SourceError;
use crate::types::{CategoryInfo, RacePage};

/// Paginated race history of a category, newest first.
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    /// Fetch one page (1-based). `total_pages` is reported on every page.
    ///
    /// Entrants of each returned record must already be in finish order.
    async fn fetch_page(
        &self,
        slug: &str,
        page: u32,
        with_entrants: bool,
    ) -> Result<RacePage, SourceError>;
}

/// Display metadata of a category.
#[allow(async_fn_in_trait)]
pub trait CategorySource {
    async fn fetch_category_info(&self, slug: &str) -> Result<CategoryInfo, SourceError>;

    /// Whether `slug` resolves upstream. Transport failures count as invalid.
    async fn is_valid_category(&self, slug: &str) -> bool {
        self.fetch_category_info(slug).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Categories;

    impl CategorySource for Categories {
        async fn fetch_category_info(&self, slug: &str) -> Result<CategoryInfo, SourceError> {
            match slug {
                "lozssr" => Ok(CategoryInfo {
                    display_name: "Skyward Sword Randomizer".to_string(),
                    external_url: "/lozssr".to_string(),
                    available_goals: vec!["Beat the game".to_string()],
                }),
                "offline" => Err(SourceError::Transport("connection refused".to_string())),
                other => Err(SourceError::InvalidCategory(other.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_is_valid_category() {
        assert!(Categories.is_valid_category("lozssr").await);
        assert!(!Categories.is_valid_category("nope").await);
        assert!(!Categories.is_valid_category("offline").await);
    }
}
