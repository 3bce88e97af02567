use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::matrix::CheckboxState;

/// Column declaration for a listing table.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    pub sortable: bool,
    pub sort_key: String,
    pub width: Option<String>,
    pub align: Align,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Single active sort: one column key plus direction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SortSpec {
    pub column: String,
    pub dir: SortDir,
}

impl SortSpec {
    pub fn from_params(sort: Option<&str>, dir: Option<&str>) -> Self {
        SortSpec {
            column: sort.unwrap_or("").to_string(),
            dir: if dir == Some("desc") { SortDir::Desc } else { SortDir::Asc },
        }
    }

    pub fn dir_str(&self) -> &'static str {
        match self.dir {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }

    /// A repeated click on the active column flips direction; a click on any
    /// other column activates it ascending.
    pub fn click(&mut self, column: &str) {
        if self.column == column {
            self.dir = match self.dir {
                SortDir::Asc => SortDir::Desc,
                SortDir::Desc => SortDir::Asc,
            };
        } else {
            self.column = column.to_string();
            self.dir = SortDir::Asc;
        }
    }
}

/// Sort rows by the active column. An explicit function of
/// (column, direction, data): `cell` extracts the comparable cell text for a
/// given column key. Stable, so equal keys keep their incoming order.
pub fn sort_rows<T>(rows: &mut [T], spec: &SortSpec, cell: impl Fn(&T, &str) -> String) {
    if spec.column.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        let ord = cell(a, &spec.column).cmp(&cell(b, &spec.column));
        match spec.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
}

/// Page-scoped row selection. The id set is owned by the table's caller;
/// "select all" covers the current page only, never other server-side pages.
#[derive(Debug, Clone, Default)]
pub struct PageSelection {
    selected: BTreeSet<i64>,
}

impl PageSelection {
    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    pub fn ids(&self) -> Vec<i64> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn toggle(&mut self, id: i64) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Header checkbox action: a fully-selected page clears, anything else
    /// selects the whole page.
    pub fn toggle_all(&mut self, page_ids: &[i64]) {
        let all = !page_ids.is_empty() && page_ids.iter().all(|id| self.selected.contains(id));
        if all {
            for id in page_ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(page_ids.iter().copied());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Header checkbox state from page-scoped membership: partial selection
    /// drives indeterminate.
    pub fn header_state(&self, page_ids: &[i64]) -> CheckboxState {
        let selected = page_ids.iter().filter(|id| self.selected.contains(id)).count();
        CheckboxState::from_counts(selected, page_ids.len())
    }
}

/// Pagination display state. Page changes are computed for the caller's
/// callback, not applied internally.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current: i64,
    pub page_size: i64,
    pub total: i64,
}

impl Pagination {
    pub fn new(current: i64, page_size: i64, total: i64) -> Self {
        Pagination {
            current: current.max(1),
            page_size: page_size.max(1),
            total: total.max(0),
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.total == 0 {
            return 1;
        }
        (self.total + self.page_size - 1) / self.page_size
    }

    /// The page number "next" should navigate to, if any.
    pub fn next_page(&self) -> Option<i64> {
        (self.current < self.total_pages()).then(|| self.current + 1)
    }

    pub fn prev_page(&self) -> Option<i64> {
        (self.current > 1).then(|| self.current - 1)
    }

    /// Changing the page size resets to page 1.
    pub fn set_page_size(&mut self, page_size: i64) {
        self.page_size = page_size.max(1);
        self.current = 1;
    }
}
