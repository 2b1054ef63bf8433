//! Design summary: the figures reported after a load.

use std::fmt;
use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::db::{Block, Database};
use crate::loader::LoadReport;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
pub struct DesignSummary {
    /// Top block name.
    pub block: String,
    /// Design name recorded from the DEF header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
    pub instances: usize,
    pub nets: usize,
    pub pins: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub die_area_um2: Option<f64>,
    /// Sum of the areas of all placed masters that resolve in a library.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_area_um2: Option<f64>,
    /// Distinct masters referenced by the design.
    pub masters_used: usize,
    /// Masters referenced by the design but found in no loaded library.
    pub unresolved_masters: usize,
}

pub fn summarize(db: &Database, block: &Block) -> DesignSummary {
    let usage = block.insts.iter().map(|i| i.master.as_str()).counts();

    let mut cell_area = 0.0;
    let mut have_area = false;
    let mut unresolved = 0;
    for (&master, &count) in &usage {
        match db.master(master) {
            Some(m) => {
                if let Some(area) = m.area() {
                    cell_area += area * count as f64;
                    have_area = true;
                }
            }
            None => unresolved += 1,
        }
    }

    DesignSummary {
        block: block.name().to_string(),
        design: block.design_name.as_ref().map(|n| n.to_string()),
        instances: block.insts.len(),
        nets: block.nets.len(),
        pins: block.pins.len(),
        die_area_um2: block.die_area_um2(),
        cell_area_um2: have_area.then_some(cell_area),
        masters_used: usage.len(),
        unresolved_masters: unresolved,
    }
}

impl fmt::Display for DesignSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Design name: {}", self.block)?;
        if let Some(design) = &self.design {
            writeln!(f, "DEF design: {design}")?;
        }
        writeln!(f, "Number of instances: {}", self.instances)?;
        writeln!(f, "Number of nets: {}", self.nets)?;
        writeln!(f, "Number of pins: {}", self.pins)?;
        if let Some(area) = self.die_area_um2 {
            writeln!(f, "Die area: {area:.3} um^2")?;
        }
        if let Some(area) = self.cell_area_um2 {
            writeln!(f, "Cell area: {area:.3} um^2")?;
        }
        write!(f, "Masters used: {}", self.masters_used)?;
        if self.unresolved_masters > 0 {
            write!(f, " ({} unresolved)", self.unresolved_masters)?;
        }
        Ok(())
    }
}

/// Writes the JSON run report: the summary plus the per-file load outcomes.
pub fn write_report(path: &Path, summary: &DesignSummary, files: &LoadReport) -> Result<()> {
    #[derive(Serialize)]
    struct Report<'a> {
        summary: &'a DesignSummary,
        files: &'a LoadReport,
    }
    let f = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(f, &Report { summary, files })?;
    Ok(())
}
