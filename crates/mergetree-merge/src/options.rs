use serde::{Deserialize, Serialize};

/// Options for a [`MergeSession`](crate::MergeSession).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Allow several inputs to define the same file; the last input wins.
    pub overwrite: bool,
    /// Label attached to the session's log span.
    pub annotation: Option<String>,
    /// Force symlinks on or off instead of probing the platform.
    ///
    /// Only consulted when the session builds its own filesystem handle.
    pub symlinks: Option<bool>,
}

impl MergeOptions {
    /// Options with overwriting enabled.
    pub fn overwriting() -> Self {
        Self {
            overwrite: true,
            ..Default::default()
        }
    }

    /// Name used for the session's log span.
    pub fn display_name(&self) -> String {
        format!("merge-trees: {}", self.annotation.as_deref().unwrap_or(""))
    }
}
