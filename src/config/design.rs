use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// The input file set for one load, as read from a TOML configuration file.
///
/// SDC, SPEF, and Liberty inputs are accepted here but not yet read; the
/// loader reports them as skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignConfig {
    /// Placed/routed design (DEF).
    #[serde(default)]
    pub design: Option<PathBuf>,
    /// Cell libraries (LEF).
    #[serde(default)]
    pub lef: Vec<PathBuf>,
    /// Technology definitions (tech LEF).
    #[serde(default)]
    pub tech_lef: Vec<PathBuf>,
    /// Cell timing models (Liberty).
    #[serde(default)]
    pub liberty: Vec<PathBuf>,
    /// Timing constraints (SDC).
    #[serde(default)]
    pub sdc: Option<PathBuf>,
    /// Parasitics (SPEF).
    #[serde(default)]
    pub spef: Option<PathBuf>,
}

pub fn parse_design_config(path: impl AsRef<Path>) -> Result<DesignConfig> {
    let contents = fs::read_to_string(path)?;
    let data = toml::from_str(&contents)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parses_full_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chipdb.toml");
        fs::write(
            &path,
            r#"
design = "designs/spm.def"
lef = ["pdk/cells.lef", "macros/sram.lef"]
tech_lef = ["pdk/tech.lef"]
liberty = ["pdk/cells.lib"]
sdc = "constraints.sdc"
"#,
        )
        .unwrap();

        let config = parse_design_config(&path).unwrap();
        assert_eq!(config.design.as_deref(), Some(Path::new("designs/spm.def")));
        assert_eq!(config.lef.len(), 2);
        assert_eq!(config.tech_lef, vec![PathBuf::from("pdk/tech.lef")]);
        assert_eq!(config.sdc.as_deref(), Some(Path::new("constraints.sdc")));
        assert_eq!(config.spef, None);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chipdb.toml");
        fs::write(&path, "design = \"top.def\"\n").unwrap();

        let config = parse_design_config(&path).unwrap();
        assert!(config.lef.is_empty());
        assert!(config.tech_lef.is_empty());
        assert!(config.liberty.is_empty());
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(parse_design_config(dir.path().join("nope.toml")).is_err());
    }
}
