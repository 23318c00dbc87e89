use sea_orm::{ConnectionTrait, DbErr, Paginator, SelectorTrait};
use serde::{Deserialize, Serialize};

pub const PER_PAGE: u64 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

impl PageQuery {
    /// One-based, never below 1.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub last_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        Self {
            items,
            total,
            page,
            per_page,
            last_page: total.div_ceil(per_page).max(1),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            last_page: self.last_page,
        }
    }
}

/// Runs `paginator` for the one-based `page`. Pages past the end come back
/// empty without querying rows, so the offset never overflows.
pub async fn fetch<'db, C, S>(
    paginator: Paginator<'db, C, S>,
    page: u64,
) -> Result<Page<S::Item>, DbErr>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    let total = paginator.num_items().await?;
    let empty = Page::new(Vec::new(), total, page, PER_PAGE);
    if page == 0 || page > empty.last_page {
        return Ok(empty);
    }

    let items = paginator.fetch_page(page - 1).await?;
    Ok(Page::new(items, total, page, PER_PAGE))
}
