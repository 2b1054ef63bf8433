//! The load facade.
//!
//! Reads every configured input file into a fresh [`Database`], best-effort:
//! a file that fails to load is reported and the sequence continues. The
//! database (with its chip and top block) is returned regardless, together
//! with a [`LoadReport`] recording one outcome per input file so that callers
//! can tell full success from partial failure.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::progress::StepContext;
use crate::config::DesignConfig;
use crate::db::Database;

/// Name given to the top-level block before the design is parsed into it.
pub const TOP_BLOCK_NAME: &str = "top";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    ReadLef,
    ReadTechLef,
    ReadDesign,
    WriteReport,
}

impl TaskKey {
    pub fn description(&self) -> &'static str {
        match self {
            TaskKey::ReadLef => "read cell libraries",
            TaskKey::ReadTechLef => "read technology definitions",
            TaskKey::ReadDesign => "read design",
            TaskKey::WriteReport => "write report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Lef,
    TechLef,
    Def,
    Sdc,
    Spef,
    Liberty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded,
    Failed,
    /// The file format is accepted in the configuration but not implemented.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub kind: FileKind,
    pub status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct LoadReport {
    pub outcomes: Vec<FileOutcome>,
}

impl LoadReport {
    fn record(&mut self, kind: FileKind, path: &Path, status: LoadStatus, error: Option<String>) {
        self.outcomes.push(FileOutcome {
            path: path.to_path_buf(),
            kind,
            status,
            error,
        });
    }

    /// True when no input file failed. Skipped (unimplemented) inputs do not
    /// count as failures.
    pub fn all_loaded(&self) -> bool {
        self.outcomes.iter().all(|o| o.status != LoadStatus::Failed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == LoadStatus::Failed)
    }
}

pub struct LoadParams<'a> {
    pub config: &'a DesignConfig,
    pub ctx: Option<&'a mut StepContext>,
}

macro_rules! try_finish_task {
    ( $ctx:expr, $task:expr ) => {
        if let Some(ctx) = $ctx.as_mut() {
            ctx.finish($task);
        }
    };
}

pub fn load_design(params: LoadParams) -> (Database, LoadReport) {
    let LoadParams { config, mut ctx } = params;
    let mut db = Database::new();
    let mut report = LoadReport::default();

    for path in &config.lef {
        match db.read_lef(path) {
            Ok(lib) => {
                log::info!("loaded {} macros from {}", lib.cells.len(), path.display());
                report.record(FileKind::Lef, path, LoadStatus::Loaded, None);
            }
            Err(e) => {
                log::error!("error reading LEF file {}: {}", path.display(), e);
                report.record(FileKind::Lef, path, LoadStatus::Failed, Some(e.to_string()));
            }
        }
    }
    try_finish_task!(ctx, TaskKey::ReadLef);

    for path in &config.tech_lef {
        match db.read_tech_lef(path) {
            Ok(layers) => {
                log::info!("loaded {} layers from {}", layers, path.display());
                report.record(FileKind::TechLef, path, LoadStatus::Loaded, None);
            }
            Err(e) => {
                log::error!("error reading tech LEF file {}: {}", path.display(), e);
                report.record(
                    FileKind::TechLef,
                    path,
                    LoadStatus::Failed,
                    Some(e.to_string()),
                );
            }
        }
    }
    try_finish_task!(ctx, TaskKey::ReadTechLef);

    db.create_chip(TOP_BLOCK_NAME);
    match &config.design {
        Some(path) => match db.read_design(path) {
            Ok(()) => {
                log::info!("read design from {}", path.display());
                report.record(FileKind::Def, path, LoadStatus::Loaded, None);
            }
            Err(e) => {
                log::error!("error reading DEF file {}: {}", path.display(), e);
                report.record(FileKind::Def, path, LoadStatus::Failed, Some(e.to_string()));
            }
        },
        None => log::warn!("no design file configured; top block left empty"),
    }
    try_finish_task!(ctx, TaskKey::ReadDesign);

    if let Some(path) = &config.sdc {
        log::warn!(
            "timing constraints are not implemented; ignoring {}",
            path.display()
        );
        report.record(FileKind::Sdc, path, LoadStatus::Skipped, None);
    }
    if let Some(path) = &config.spef {
        log::warn!(
            "parasitics are not implemented; ignoring {}",
            path.display()
        );
        report.record(FileKind::Spef, path, LoadStatus::Skipped, None);
    }
    for path in &config.liberty {
        log::warn!(
            "cell timing models are not implemented; ignoring {}",
            path.display()
        );
        report.record(FileKind::Liberty, path, LoadStatus::Skipped, None);
    }

    (db, report)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use tempfile::tempdir;

    use super::*;
    use crate::config::DesignConfig;

    const CELLS_LEF: &str = r#"VERSION 5.8 ;
BUSBITCHARS "[]" ;
DIVIDERCHAR "/" ;
MACRO INVX1
  CLASS CORE ;
  SIZE 1.38 BY 2.72 ;
  PIN A
    DIRECTION INPUT ;
  END A
  PIN Y
    DIRECTION OUTPUT ;
  END Y
END INVX1
MACRO DFFX1
  CLASS CORE ;
  SIZE 4.14 BY 2.72 ;
  PIN D
    DIRECTION INPUT ;
  END D
  PIN CLK
    DIRECTION INPUT ;
  END CLK
  PIN Q
    DIRECTION OUTPUT ;
  END Q
END DFFX1
END LIBRARY
"#;

    const TECH_LEF: &str = "\
LAYER met1
  TYPE ROUTING ;
  DIRECTION HORIZONTAL ;
  PITCH 0.34 ;
END met1
END LIBRARY
";

    const DESIGN_DEF: &str = r#"VERSION 5.8 ;
DESIGN spm ;
UNITS DISTANCE MICRONS 1000 ;
DIEAREA ( 0 0 ) ( 100000 100000 ) ;
COMPONENTS 3 ;
- u1 INVX1 + PLACED ( 1000 2000 ) N ;
- u2 INVX1 + PLACED ( 3000 2000 ) FS ;
- u3 DFFX1 + UNPLACED ;
END COMPONENTS
PINS 2 ;
- clk + NET clk + DIRECTION INPUT ;
- dout + NET n4 + DIRECTION OUTPUT ;
END PINS
NETS 5 ;
- clk ( PIN clk ) ( u3 CLK ) ;
- n1 ( u1 A ) ( u3 Q ) ;
- n2 ( u1 Y ) ( u2 A ) ;
- n3 ( u2 Y ) ( u3 D ) ;
- n4 ( PIN dout ) ( u3 Q ) ;
END NETS
END DESIGN
"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_well_formed_design() {
        let dir = tempdir().unwrap();
        let config = DesignConfig {
            design: Some(write(dir.path(), "design.def", DESIGN_DEF)),
            lef: vec![write(dir.path(), "cells.lef", CELLS_LEF)],
            tech_lef: vec![write(dir.path(), "tech.lef", TECH_LEF)],
            ..Default::default()
        };

        let (db, report) = load_design(LoadParams {
            config: &config,
            ctx: None,
        });
        assert!(report.all_loaded());

        let block = db.top_block().expect("top block");
        assert_eq!(block.name(), "top");
        assert_eq!(block.design_name.as_deref(), Some("spm"));
        assert_eq!(block.insts.len(), 3);
        assert_eq!(block.nets.len(), 5);
        assert_eq!(block.pins.len(), 2);
        assert_eq!(db.libs().len(), 1);
        assert_eq!(db.tech().layers.len(), 1);
    }

    #[test]
    fn missing_lef_is_reported_but_not_fatal() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("missing.lef");
        let config = DesignConfig {
            design: Some(write(dir.path(), "design.def", DESIGN_DEF)),
            lef: vec![bad.clone(), write(dir.path(), "cells.lef", CELLS_LEF)],
            ..Default::default()
        };

        let (db, report) = load_design(LoadParams {
            config: &config,
            ctx: None,
        });
        assert!(!report.all_loaded());
        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path, bad);
        assert_eq!(failed[0].kind, FileKind::Lef);

        // Best-effort: the good library and the design still load.
        assert_eq!(db.libs().len(), 1);
        assert_eq!(db.top_block().unwrap().insts.len(), 3);
    }

    #[test]
    fn unparseable_design_leaves_empty_block() {
        let dir = tempdir().unwrap();
        let config = DesignConfig {
            design: Some(write(dir.path(), "design.def", "this is not a def file")),
            ..Default::default()
        };

        let (db, report) = load_design(LoadParams {
            config: &config,
            ctx: None,
        });
        assert!(!report.all_loaded());

        let block = db.top_block().expect("top block exists regardless");
        assert_eq!(block.insts.len(), 0);
        assert_eq!(block.nets.len(), 0);
    }

    #[test]
    fn unimplemented_formats_are_skipped_not_failed() {
        let dir = tempdir().unwrap();
        let config = DesignConfig {
            design: Some(write(dir.path(), "design.def", DESIGN_DEF)),
            sdc: Some(PathBuf::from("constraints.sdc")),
            spef: Some(PathBuf::from("parasitics.spef")),
            liberty: vec![PathBuf::from("cells.lib")],
            ..Default::default()
        };

        let (_db, report) = load_design(LoadParams {
            config: &config,
            ctx: None,
        });
        assert!(report.all_loaded());
        let skipped: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| o.status == LoadStatus::Skipped)
            .collect();
        assert_eq!(skipped.len(), 3);
    }
}
