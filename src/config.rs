use std::path::PathBuf;

pub const WORKSPACE_ENV: &str = "GRADEBOOKD_WORKSPACE";
pub const LOG_ENV: &str = "GRADEBOOKD_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

/// Process-level settings. Workspace-level settings live in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let workspace = lookup(WORKSPACE_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_filter = lookup(LOG_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Self {
            workspace,
            log_filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset_or_blank() {
        let cfg = DaemonConfig::from_lookup(|_| None);
        assert_eq!(cfg.workspace, None);
        assert_eq!(cfg.log_filter, "info");

        let cfg = DaemonConfig::from_lookup(|_| Some("   ".to_string()));
        assert_eq!(cfg.workspace, None);
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn reads_workspace_and_filter() {
        let env: HashMap<&str, &str> = [
            (WORKSPACE_ENV, "/tmp/grades"),
            (LOG_ENV, "gradebookd=debug"),
        ]
        .into_iter()
        .collect();
        let cfg = DaemonConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.workspace, Some(PathBuf::from("/tmp/grades")));
        assert_eq!(cfg.log_filter, "gradebookd=debug");
    }
}
