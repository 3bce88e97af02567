use std::collections::BTreeSet;

use super::types::{RoleDetail, RolePayload};
use crate::errors::FieldErrors;
use crate::models::matrix::filter_permissions;
use crate::models::permission::Permission;

/// Selected share above which the UI shows a "high selection" warning.
pub const HIGH_SELECTION_PERCENT: f64 = 70.0;

/// Transient role-editing state. Lives only for the duration of one editing
/// session: seeded from an existing role or empty, discarded on submit or
/// cancel. The selection is a true set; the `search`/`group` filters narrow
/// what is displayed and never touch it.
#[derive(Debug, Clone, Default)]
pub struct RoleForm {
    pub name: String,
    pub display_name: String,
    pub description: String,
    selected: BTreeSet<i64>,
    pub search: String,
    /// None means "all groups" (grouped matrix); Some narrows to one group
    /// (flat matrix).
    pub group: Option<String>,
    errors: FieldErrors,
}

impl RoleForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the draft from an existing role for editing.
    pub fn from_role(role: &RoleDetail) -> Self {
        RoleForm {
            name: role.name.clone(),
            display_name: role.display_name.clone(),
            description: role.description.clone(),
            selected: role.permissions.iter().map(|p| p.id).collect(),
            ..Default::default()
        }
    }

    /// Seed the draft from a submitted write payload (server-side validation).
    pub fn from_payload(payload: &RolePayload) -> Self {
        RoleForm {
            name: payload.name.clone(),
            display_name: payload.display_name.clone(),
            description: payload.description.clone(),
            selected: payload.permissions.iter().copied().collect(),
            ..Default::default()
        }
    }

    // --- field edits: changing a field clears only its own stale error ---

    pub fn set_name(&mut self, value: &str) {
        self.name = value.to_string();
        self.errors.remove("name");
    }

    pub fn set_display_name(&mut self, value: &str) {
        self.display_name = value.to_string();
        self.errors.remove("display_name");
    }

    pub fn set_description(&mut self, value: &str) {
        self.description = value.to_string();
    }

    // --- display filters: orthogonal to selection ---

    pub fn set_search(&mut self, value: &str) {
        self.search = value.to_string();
    }

    pub fn set_group(&mut self, value: Option<&str>) {
        self.group = value.map(str::to_string);
    }

    /// The permissions currently displayed: universe ∩ group filter ∩
    /// case-insensitive substring match on display name or description.
    pub fn filtered<'a>(&self, universe: &'a [Permission]) -> Vec<&'a Permission> {
        filter_permissions(universe, &self.search, self.group.as_deref())
    }

    // --- selection: set-membership operations, duplicates impossible ---

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn selection(&self) -> &BTreeSet<i64> {
        &self.selected
    }

    /// Symmetric membership flip; toggling twice is a no-op overall.
    pub fn toggle_permission(&mut self, id: i64) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        self.errors.remove("permissions");
    }

    /// Toggle a whole group atomically. Only a fully-selected group clears;
    /// a partially-selected group completes to fully-selected (idempotent
    /// union), never to empty.
    pub fn toggle_group(&mut self, group_ids: &[i64]) {
        if group_ids.is_empty() {
            return;
        }
        let fully_selected = group_ids.iter().all(|id| self.selected.contains(id));
        if fully_selected {
            for id in group_ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(group_ids.iter().copied());
        }
        self.errors.remove("permissions");
    }

    // --- derived metrics (informational only) ---

    /// Selected share of the universe, in percent.
    pub fn selected_percent(&self, universe_len: usize) -> f64 {
        if universe_len == 0 {
            return 0.0;
        }
        self.selected.len() as f64 * 100.0 / universe_len as f64
    }

    pub fn is_high_selection(&self, universe_len: usize) -> bool {
        self.selected_percent(universe_len) > HIGH_SELECTION_PERCENT
    }

    // --- validation: run on submit attempt, not per keystroke ---

    /// Populate the field error map. Returns true when the draft is
    /// submittable.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        if self.name.trim().is_empty() {
            self.errors.insert("name".to_string(), "Name is required".to_string());
        }
        if self.display_name.trim().is_empty() {
            self.errors
                .insert("display_name".to_string(), "Display name is required".to_string());
        }
        if self.selected.is_empty() {
            self.errors.insert(
                "permissions".to_string(),
                "Select at least one permission".to_string(),
            );
        }
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Serialize for submission. The set becomes an ordered id list only
    /// here, at the wire boundary.
    pub fn payload(&self) -> RolePayload {
        RolePayload {
            name: self.name.trim().to_string(),
            display_name: self.display_name.trim().to_string(),
            description: self.description.trim().to_string(),
            permissions: self.selected.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(id: i64, display: &str, group: &str) -> Permission {
        Permission {
            id,
            name: format!("{group}.{id}"),
            display_name: display.to_string(),
            description: None,
            group_key: group.to_string(),
            is_dangerous: false,
            requires_confirmation: false,
        }
    }

    /// 5 permissions: ids 1-2 in "billing", ids 3-5 in "ops".
    fn universe() -> Vec<Permission> {
        vec![
            perm(1, "View billing", "billing"),
            perm(2, "Issue refunds", "billing"),
            perm(3, "Restart services", "ops"),
            perm(4, "Read logs", "ops"),
            perm(5, "Deploy", "ops"),
        ]
    }

    fn ids(form: &RoleForm) -> Vec<i64> {
        form.selection().iter().copied().collect()
    }

    #[test]
    fn partial_group_click_completes_the_set() {
        let mut form = RoleForm::new();
        form.toggle_permission(3);
        // ops is partially selected; clicking the group checkbox must move it
        // to fully selected, never to empty.
        form.toggle_group(&[3, 4, 5]);
        assert_eq!(ids(&form), vec![3, 4, 5]);
    }

    #[test]
    fn full_group_click_clears_the_group() {
        let mut form = RoleForm::new();
        form.toggle_group(&[3, 4, 5]);
        assert_eq!(ids(&form), vec![3, 4, 5]);
        form.toggle_group(&[3, 4, 5]);
        assert!(ids(&form).is_empty());
    }

    #[test]
    fn individual_toggle_is_an_involution() {
        let mut form = RoleForm::new();
        form.toggle_permission(2);
        let before = ids(&form);
        form.toggle_permission(4);
        form.toggle_permission(4);
        assert_eq!(ids(&form), before);
    }

    #[test]
    fn billing_ops_scenario() {
        let mut form = RoleForm::new();
        // Select all of billing via group click.
        form.toggle_group(&[1, 2]);
        assert_eq!(ids(&form), vec![1, 2]);
        // One ops permission.
        form.toggle_permission(3);
        assert_eq!(ids(&form), vec![1, 2, 3]);
        // Billing is fully selected: group click removes exactly those two.
        form.toggle_group(&[1, 2]);
        assert_eq!(ids(&form), vec![3]);
    }

    #[test]
    fn filters_never_touch_the_selection() {
        let universe = universe();
        let mut form = RoleForm::new();
        form.toggle_group(&[1, 2]);
        let before = ids(&form);

        form.set_search("restart");
        assert_eq!(form.filtered(&universe).len(), 1);
        assert_eq!(ids(&form), before);

        form.set_group(Some("ops"));
        form.set_search("");
        assert_eq!(form.filtered(&universe).len(), 3);
        assert_eq!(ids(&form), before);
    }

    #[test]
    fn validate_flags_all_three_fields() {
        let mut form = RoleForm::new();
        form.set_name("   ");
        assert!(!form.validate());
        let errors = form.errors();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("display_name"));
        assert!(errors.contains_key("permissions"));
    }

    #[test]
    fn field_change_clears_only_its_own_error() {
        let mut form = RoleForm::new();
        assert!(!form.validate());
        form.set_name("night_audit");
        assert!(!form.errors().contains_key("name"));
        assert!(form.errors().contains_key("display_name"));
        assert!(form.errors().contains_key("permissions"));
    }

    #[test]
    fn valid_draft_produces_sorted_payload() {
        let mut form = RoleForm::new();
        form.set_name("night_audit");
        form.set_display_name("Night Audit");
        form.set_description("  End-of-day balancing  ");
        form.toggle_permission(5);
        form.toggle_permission(1);
        assert!(form.validate());

        let payload = form.payload();
        assert_eq!(payload.name, "night_audit");
        assert_eq!(payload.description, "End-of-day balancing");
        assert_eq!(payload.permissions, vec![1, 5]);
    }

    #[test]
    fn high_selection_threshold() {
        let mut form = RoleForm::new();
        form.toggle_group(&[1, 2, 3]);
        // 3 of 5 = 60%: below the 70% warning threshold.
        assert!(!form.is_high_selection(5));
        form.toggle_permission(4);
        // 4 of 5 = 80%.
        assert!(form.is_high_selection(5));
        assert_eq!(form.selected_percent(0), 0.0);
    }

    #[test]
    fn edit_round_trip_is_idempotent() {
        let universe = universe();
        let role = RoleDetail {
            id: 7,
            name: "auditor".to_string(),
            display_name: "Auditor".to_string(),
            description: "Read-only oversight".to_string(),
            is_system_role: false,
            users_count: 2,
            permissions: vec![universe[4].clone(), universe[0].clone()],
            created_at: String::new(),
            updated_at: String::new(),
        };
        let form = RoleForm::from_role(&role);
        assert_eq!(form.payload(), role.to_payload());
    }
}
