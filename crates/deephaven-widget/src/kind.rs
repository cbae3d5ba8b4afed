//! Display kind classification.
//!
//! Objects are classified by their type identity: the module-qualified class
//! name reported by the host runtime (e.g. `deephaven.table.Table`). The set
//! of kinds is closed; anything unrecognized is shown through the generic
//! widget route rather than rejected.

use serde::{Deserialize, Serialize};

/// Type identity of a table living in the local server process.
pub const LOCAL_TABLE_TYPE: &str = "deephaven.table.Table";

/// Type identity of a table handle owned by a remote (client) session.
pub const REMOTE_TABLE_TYPE: &str = "pydeephaven.table.Table";

/// Type identities of chart objects.
pub const FIGURE_TYPES: &[&str] = &["deephaven.plot.figure.Figure"];

/// Route category selecting which iframe page renders an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Table,
    Chart,
    #[serde(rename = "widget")]
    GenericWidget,
}

impl DisplayKind {
    /// Path segment under `iframe/` for this kind.
    pub fn route(self) -> &'static str {
        match self {
            DisplayKind::Table => "table",
            DisplayKind::Chart => "chart",
            DisplayKind::GenericWidget => "widget",
        }
    }
}

impl std::fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.route())
    }
}

/// Classify a type identity string.
pub fn classify(type_identity: &str) -> DisplayKind {
    match type_identity {
        LOCAL_TABLE_TYPE | REMOTE_TABLE_TYPE => DisplayKind::Table,
        t if FIGURE_TYPES.contains(&t) => DisplayKind::Chart,
        _ => DisplayKind::GenericWidget,
    }
}

/// Whether the type identity names a table bound to a remote session.
pub fn is_remote_table(type_identity: &str) -> bool {
    type_identity == REMOTE_TABLE_TYPE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_classify_as_table() {
        assert_eq!(classify("deephaven.table.Table"), DisplayKind::Table);
        assert_eq!(classify("pydeephaven.table.Table"), DisplayKind::Table);
    }

    #[test]
    fn test_figures_classify_as_chart() {
        for name in FIGURE_TYPES {
            assert_eq!(classify(name), DisplayKind::Chart);
        }
    }

    #[test]
    fn test_unknown_types_fall_back_to_widget() {
        for name in [
            "",
            "builtins.str",
            "deephaven.table",
            "deephaven.table.Table.Extra",
            "my_plugin.widgets.Gauge",
        ] {
            assert_eq!(classify(name), DisplayKind::GenericWidget, "{name}");
        }
    }

    #[test]
    fn test_routes() {
        assert_eq!(DisplayKind::Table.route(), "table");
        assert_eq!(DisplayKind::Chart.route(), "chart");
        assert_eq!(DisplayKind::GenericWidget.to_string(), "widget");
    }

    #[test]
    fn test_serializes_as_route() {
        let json = serde_json::to_string(&DisplayKind::GenericWidget).unwrap();
        assert_eq!(json, "\"widget\"");
    }

    #[test]
    fn test_only_pydeephaven_table_is_remote() {
        assert!(is_remote_table(REMOTE_TABLE_TYPE));
        assert!(!is_remote_table(LOCAL_TABLE_TYPE));
    }
}
