use serde::{Deserialize, Serialize};

/// The backend user a resolution runs on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendUser {
    #[serde(default)]
    pub admin: bool,
    /// Comma-separated group ids, already including inherited groups.
    #[serde(default)]
    pub groups: String,
}

impl BackendUser {
    pub fn admin() -> Self {
        Self {
            admin: true,
            groups: String::new(),
        }
    }

    pub fn with_groups(groups: impl Into<String>) -> Self {
        Self {
            admin: false,
            groups: groups.into(),
        }
    }

    /// Admins see everything; otherwise the user needs one required group.
    pub fn may_use(&self, required_groups: &str) -> bool {
        required_groups.trim().is_empty()
            || self.admin
            || has_group_access(&self.groups, required_groups)
    }
}

/// True when `required_groups` is empty or shares at least one id with
/// `user_groups`. Both are comma-separated lists.
pub fn has_group_access(user_groups: &str, required_groups: &str) -> bool {
    let required: Vec<&str> = csv(required_groups).collect();
    if required.is_empty() {
        return true;
    }
    csv(user_groups).any(|group| required.contains(&group))
}

pub(crate) fn csv(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}
