use anyhow::{Context, Result, bail};
use permissions::PermissionsConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "permissions.toml";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("aclsync"))
}

/// Resolve the permissions file: explicit path (with `~` expanded) or default
pub fn resolve_path(explicit: Option<&str>) -> Result<PathBuf> {
    match explicit {
        Some(path) => {
            let expanded = shellexpand::tilde(path);
            Ok(PathBuf::from(expanded.as_ref()))
        }
        None => Ok(config_dir()?.join(CONFIG_FILE)),
    }
}

// ============================================================================
// Permissions File
// ============================================================================

/// Declared permissions, one `[[permissions]]` table per object.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PermissionsFile {
    #[serde(default)]
    pub permissions: Vec<PermissionsConfig>,
}

impl PermissionsFile {
    /// Load and parse a permissions file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid permissions file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Declarations to act on: all, or those whose label matches `target`
    pub fn select(&self, target: Option<&str>) -> Result<Vec<&PermissionsConfig>> {
        let Some(target) = target else {
            return Ok(self.permissions.iter().collect());
        };

        let selected: Vec<_> = self
            .permissions
            .iter()
            .filter(|p| p.name.as_deref() == Some(target) || p.label() == target)
            .collect();

        if selected.is_empty() {
            bail!("No declaration named '{target}'");
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permissions::{AccessControlChange, IdentifierValue, ObjectType};
    use std::io::Write;

    const SAMPLE: &str = r#"
[[permissions]]
name = "etl-cluster"
cluster_id = "abc"
access_control = [
  { user_name = "ben", permission_level = "CAN_ATTACH_TO" },
]

[[permissions]]
job_id = 9
access_control = [
  { group_name = "data", permission_level = "CAN_VIEW" },
]
"#;

    #[test]
    fn test_parse_sample() {
        let file = PermissionsFile::parse(SAMPLE).unwrap();
        assert_eq!(file.permissions.len(), 2);

        let cluster = file.permissions[0].validate().unwrap();
        assert_eq!(cluster.object_type, ObjectType::Cluster);
        assert_eq!(
            cluster.access_control,
            vec![AccessControlChange::user("ben", "CAN_ATTACH_TO")]
        );

        assert_eq!(
            file.permissions[1].identifiers.get("job_id"),
            Some(&IdentifierValue::Number(9))
        );
    }

    #[test]
    fn test_select() {
        let file = PermissionsFile::parse(SAMPLE).unwrap();
        assert_eq!(file.select(None).unwrap().len(), 2);
        assert_eq!(file.select(Some("etl-cluster")).unwrap().len(), 1);
        assert_eq!(file.select(Some("job_id = 9")).unwrap().len(), 1);
        assert!(file.select(Some("missing")).is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let loaded = PermissionsFile::load(file.path()).unwrap();
        assert_eq!(loaded.permissions[0].label(), "etl-cluster");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PermissionsFile::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[[permissions]\ncluster_id = ").unwrap();
        let err = PermissionsFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid permissions file"));
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            resolve_path(Some("/tmp/p.toml")).unwrap(),
            PathBuf::from("/tmp/p.toml")
        );
        let expanded = resolve_path(Some("~/p.toml")).unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
