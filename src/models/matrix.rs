use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::permission::{Permission, PermissionGroup};

/// Tri-state checkbox model. `indeterminate` is carried independently of
/// `checked`; clients synchronize it to the control after each render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckboxState {
    pub checked: bool,
    pub indeterminate: bool,
}

impl CheckboxState {
    /// Derive the group-header state from membership counts:
    /// all selected -> checked, none -> unchecked, some -> indeterminate
    /// (visually unchecked).
    pub fn from_counts(selected: usize, total: usize) -> Self {
        CheckboxState {
            checked: total > 0 && selected == total,
            indeterminate: selected > 0 && selected < total,
        }
    }
}

/// One permission row: checkbox + display name + danger/confirmation badge
/// data + optional description for the tooltip.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixRow {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_dangerous: bool,
    pub requires_confirmation: bool,
    pub checked: bool,
}

impl MatrixRow {
    fn build(p: &Permission, selected: &BTreeSet<i64>) -> Self {
        MatrixRow {
            id: p.id,
            name: p.name.clone(),
            display_name: p.display_name.clone(),
            description: p.description.clone(),
            is_dangerous: p.is_dangerous,
            requires_confirmation: p.requires_confirmation,
            checked: selected.contains(&p.id),
        }
    }
}

/// A group section: header checkbox state, "N / total" badge counts, and the
/// member rows.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixGroup {
    pub key: String,
    pub display_name: String,
    pub state: CheckboxState,
    pub selected_count: usize,
    pub total_count: usize,
    pub rows: Vec<MatrixRow>,
}

/// The permission matrix view model. Flat when the caller has already
/// narrowed to a single group, grouped otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatrixView {
    Flat { rows: Vec<MatrixRow> },
    Grouped { groups: Vec<MatrixGroup> },
}

impl MatrixView {
    /// Build the matrix from an already-filtered permission slice.
    /// In grouped mode, groups with zero matching permissions are omitted
    /// entirely; group order follows the catalogue.
    pub fn build(
        permissions: &[&Permission],
        groups: &[PermissionGroup],
        selected: &BTreeSet<i64>,
        show_group_filter: bool,
    ) -> Self {
        if !show_group_filter {
            return MatrixView::Flat {
                rows: permissions.iter().map(|p| MatrixRow::build(p, selected)).collect(),
            };
        }

        let sections = groups
            .iter()
            .filter_map(|g| {
                let rows: Vec<MatrixRow> = permissions
                    .iter()
                    .filter(|p| p.group_key == g.key)
                    .map(|p| MatrixRow::build(p, selected))
                    .collect();
                if rows.is_empty() {
                    return None;
                }
                let selected_count = rows.iter().filter(|r| r.checked).count();
                let total_count = rows.len();
                Some(MatrixGroup {
                    key: g.key.clone(),
                    display_name: g.display_name.clone(),
                    state: CheckboxState::from_counts(selected_count, total_count),
                    selected_count,
                    total_count,
                    rows,
                })
            })
            .collect();

        MatrixView::Grouped { groups: sections }
    }
}

/// Narrow the universe by group key and case-insensitive substring match
/// against display name or description. Filtering is a display concern only;
/// it never touches the selection.
pub fn filter_permissions<'a>(
    universe: &'a [Permission],
    search: &str,
    group: Option<&str>,
) -> Vec<&'a Permission> {
    let needle = search.trim().to_lowercase();
    universe
        .iter()
        .filter(|p| group.is_none_or(|g| p.group_key == g))
        .filter(|p| {
            if needle.is_empty() {
                return true;
            }
            p.display_name.to_lowercase().contains(&needle)
                || p.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(id: i64, name: &str, display: &str, group: &str) -> Permission {
        Permission {
            id,
            name: name.to_string(),
            display_name: display.to_string(),
            description: None,
            group_key: group.to_string(),
            is_dangerous: false,
            requires_confirmation: false,
        }
    }

    fn group(key: &str, display: &str, count: i64) -> PermissionGroup {
        PermissionGroup {
            key: key.to_string(),
            display_name: display.to_string(),
            description: None,
            permissions_count: count,
        }
    }

    fn universe() -> (Vec<Permission>, Vec<PermissionGroup>) {
        let perms = vec![
            perm(1, "billing.view", "View billing", "billing"),
            perm(2, "billing.refund", "Issue refunds", "billing"),
            perm(3, "ops.restart", "Restart services", "ops"),
            perm(4, "ops.logs", "Read logs", "ops"),
            perm(5, "ops.deploy", "Deploy", "ops"),
        ];
        let groups = vec![group("billing", "Billing", 2), group("ops", "Operations", 3)];
        (perms, groups)
    }

    #[test]
    fn checkbox_state_from_counts() {
        assert_eq!(
            CheckboxState::from_counts(3, 3),
            CheckboxState { checked: true, indeterminate: false }
        );
        assert_eq!(
            CheckboxState::from_counts(0, 3),
            CheckboxState { checked: false, indeterminate: false }
        );
        assert_eq!(
            CheckboxState::from_counts(1, 3),
            CheckboxState { checked: false, indeterminate: true }
        );
        // An empty group is never rendered, but must not read as "all selected".
        assert_eq!(
            CheckboxState::from_counts(0, 0),
            CheckboxState { checked: false, indeterminate: false }
        );
    }

    #[test]
    fn grouped_view_computes_header_states_and_counts() {
        let (perms, groups) = universe();
        let filtered: Vec<&Permission> = perms.iter().collect();
        let selected: BTreeSet<i64> = [1, 2, 3].into_iter().collect();

        let view = MatrixView::build(&filtered, &groups, &selected, true);
        let MatrixView::Grouped { groups: sections } = view else {
            panic!("expected grouped view");
        };
        assert_eq!(sections.len(), 2);

        let billing = &sections[0];
        assert_eq!(billing.key, "billing");
        assert_eq!((billing.selected_count, billing.total_count), (2, 2));
        assert!(billing.state.checked && !billing.state.indeterminate);

        let ops = &sections[1];
        assert_eq!((ops.selected_count, ops.total_count), (1, 3));
        assert!(!ops.state.checked && ops.state.indeterminate);
    }

    #[test]
    fn grouped_view_omits_empty_groups() {
        let (perms, groups) = universe();
        // Narrowed to billing only: the ops section must not appear at all.
        let filtered = filter_permissions(&perms, "billing", None);
        let view = MatrixView::build(&filtered, &groups, &BTreeSet::new(), true);
        let MatrixView::Grouped { groups: sections } = view else {
            panic!("expected grouped view");
        };
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, "billing");
    }

    #[test]
    fn empty_universe_renders_zero_sections() {
        let (_, groups) = universe();
        let view = MatrixView::build(&[], &groups, &BTreeSet::new(), true);
        let MatrixView::Grouped { groups: sections } = view else {
            panic!("expected grouped view");
        };
        assert!(sections.is_empty());
    }

    #[test]
    fn flat_view_has_no_grouping() {
        let (perms, groups) = universe();
        let filtered = filter_permissions(&perms, "", Some("ops"));
        let view = MatrixView::build(&filtered, &groups, &BTreeSet::new(), false);
        let MatrixView::Flat { rows } = view else {
            panic!("expected flat view");
        };
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn filter_matches_display_name_and_description_case_insensitive() {
        let mut p = perm(9, "billing.export", "Export invoices", "billing");
        p.description = Some("Download CSV statements".to_string());
        let universe = vec![p];

        assert_eq!(filter_permissions(&universe, "INVOICES", None).len(), 1);
        assert_eq!(filter_permissions(&universe, "csv", None).len(), 1);
        assert_eq!(filter_permissions(&universe, "refund", None).len(), 0);
    }
}
