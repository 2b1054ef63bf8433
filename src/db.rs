//! In-memory design database.
//!
//! A [`Database`] owns everything loaded in one run: cell libraries from LEF,
//! technology layers from tech LEF, and at most one [`Chip`] whose top-level
//! [`Block`] holds the design parsed from DEF. Dropping the database releases
//! every derived object, so handles cannot outlive it.

use std::path::Path;

use arcstr::ArcStr;

use crate::error::{ChipDbError, Result};

/// Integer database units, as used by DEF coordinates.
pub type Dbu = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: Dbu,
    pub y: Dbu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub lo: Point,
    pub hi: Point,
}

impl Rect {
    pub fn width(&self) -> Dbu {
        self.hi.x - self.lo.x
    }

    pub fn height(&self) -> Dbu {
        self.hi.y - self.lo.y
    }
}

#[derive(Debug, Default)]
pub struct Database {
    libs: Vec<Lib>,
    tech: Tech,
    chip: Option<Chip>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a cell LEF file and registers it as a library.
    pub fn read_lef(&mut self, path: &Path) -> Result<&Lib> {
        let lib = crate::lef::read_lef(path)?;
        self.libs.push(lib);
        Ok(&self.libs[self.libs.len() - 1])
    }

    /// Registers an already-parsed library.
    pub fn add_lib(&mut self, lib: Lib) {
        self.libs.push(lib);
    }

    /// Reads a technology LEF file, merging its layers into the technology
    /// table. Returns the number of layers added.
    pub fn read_tech_lef(&mut self, path: &Path) -> Result<usize> {
        crate::tech::read_tech_lef(path, &mut self.tech)
    }

    /// Creates the chip with an empty top-level block, or returns the
    /// existing chip. A database holds at most one chip per run.
    pub fn create_chip(&mut self, top_name: &str) -> &mut Chip {
        self.chip.get_or_insert_with(|| Chip {
            block: Block::new(top_name),
        })
    }

    /// Parses a DEF file into the chip's top block. A parse failure leaves
    /// whatever entries were read before the error in place.
    pub fn read_design(&mut self, path: &Path) -> Result<()> {
        let chip = self.chip.as_mut().ok_or(ChipDbError::NoChip)?;
        crate::def::read_def(path, &mut chip.block)?;
        Ok(())
    }

    pub fn chip(&self) -> Option<&Chip> {
        self.chip.as_ref()
    }

    pub fn top_block(&self) -> Option<&Block> {
        self.chip.as_ref().map(|c| &c.block)
    }

    pub fn libs(&self) -> &[Lib] {
        &self.libs
    }

    pub fn tech(&self) -> &Tech {
        &self.tech
    }

    /// Looks up a master by name across all loaded libraries.
    pub fn master(&self, name: &str) -> Option<&Master> {
        self.libs
            .iter()
            .flat_map(|l| l.cells.iter())
            .find(|m| m.name.as_str() == name)
    }
}

/// A cell library loaded from a single LEF file.
#[derive(Debug, Clone)]
pub struct Lib {
    pub name: String,
    pub cells: Vec<Master>,
}

/// A library cell definition.
#[derive(Debug, Clone)]
pub struct Master {
    pub name: ArcStr,
    /// Cell width in microns, when the LEF macro declares a SIZE.
    pub width: Option<f64>,
    /// Cell height in microns.
    pub height: Option<f64>,
    pub pins: usize,
}

impl Master {
    /// Cell area in square microns.
    pub fn area(&self) -> Option<f64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(w * h),
            _ => None,
        }
    }
}

/// Technology metadata accumulated across technology-LEF files.
#[derive(Debug, Clone, Default)]
pub struct Tech {
    pub layers: Vec<Layer>,
}

impl Tech {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name.as_str() == name)
    }

    pub fn routing_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.kind == LayerKind::Routing)
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub name: ArcStr,
    pub kind: LayerKind,
    pub direction: Option<LayerDirection>,
    /// Preferred routing pitch in microns.
    pub pitch: Option<f64>,
    /// Default wire width in microns.
    pub width: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Routing,
    Cut,
    Masterslice,
    Overlap,
    Implant,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerDirection {
    Horizontal,
    Vertical,
}

/// One design inside the database. Owns the top-level block.
#[derive(Debug)]
pub struct Chip {
    pub(crate) block: Block,
}

impl Chip {
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }
}

/// The netlist/layout container for one design.
#[derive(Debug)]
pub struct Block {
    name: ArcStr,
    /// DESIGN name recorded from the DEF header, if any. The block itself
    /// keeps the name it was created with.
    pub design_name: Option<ArcStr>,
    /// DEF database units per micron. The DEF default is 100.
    pub dbu_per_micron: u32,
    pub die_area: Option<Rect>,
    pub insts: Vec<Inst>,
    pub nets: Vec<Net>,
    pub pins: Vec<Pin>,
}

impl Block {
    pub fn new(name: &str) -> Self {
        Self {
            name: ArcStr::from(name),
            design_name: None,
            dbu_per_micron: 100,
            die_area: None,
            insts: Vec::new(),
            nets: Vec::new(),
            pins: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Die area in square microns, when the design declares one.
    pub fn die_area_um2(&self) -> Option<f64> {
        let die = self.die_area?;
        let dbu = f64::from(self.dbu_per_micron);
        Some((die.width() as f64 / dbu) * (die.height() as f64 / dbu))
    }
}

/// A placed (or not yet placed) cell instance.
#[derive(Debug, Clone)]
pub struct Inst {
    pub name: ArcStr,
    pub master: ArcStr,
    pub status: PlaceStatus,
    pub loc: Option<Point>,
    pub orient: Option<Orient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceStatus {
    #[default]
    Unplaced,
    Placed,
    Fixed,
    Cover,
}

/// DEF placement orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orient {
    N,
    S,
    E,
    W,
    Fn,
    Fs,
    Fe,
    Fw,
}

impl Orient {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "N" => Some(Orient::N),
            "S" => Some(Orient::S),
            "E" => Some(Orient::E),
            "W" => Some(Orient::W),
            "FN" => Some(Orient::Fn),
            "FS" => Some(Orient::Fs),
            "FE" => Some(Orient::Fe),
            "FW" => Some(Orient::Fw),
            _ => None,
        }
    }
}

/// A connection between cell terminals, or to a block pin.
#[derive(Debug, Clone)]
pub struct Net {
    pub name: ArcStr,
    /// Set for nets from the SPECIALNETS section (power, ground, clock trees).
    pub special: bool,
    pub conns: Vec<NetConn>,
}

/// A net connection: an (instance, pin) pair, or a block pin when `inst` is
/// `None`.
#[derive(Debug, Clone)]
pub struct NetConn {
    pub inst: Option<ArcStr>,
    pub pin: ArcStr,
}

/// A block terminal.
#[derive(Debug, Clone)]
pub struct Pin {
    pub name: ArcStr,
    pub net: Option<ArcStr>,
    pub direction: Option<PinDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
    Inout,
    Feedthru,
}

impl PinDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INPUT" => Some(PinDirection::Input),
            "OUTPUT" => Some(PinDirection::Output),
            "INOUT" => Some(PinDirection::Inout),
            "FEEDTHRU" => Some(PinDirection::Feedthru),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn master(name: &str, width: f64, height: f64) -> Master {
        Master {
            name: ArcStr::from(name),
            width: Some(width),
            height: Some(height),
            pins: 2,
        }
    }

    #[test]
    fn master_lookup_spans_libraries() {
        let mut db = Database::new();
        db.add_lib(Lib {
            name: "stdcells".to_string(),
            cells: vec![master("INVX1", 1.38, 2.72)],
        });
        db.add_lib(Lib {
            name: "sram_macros".to_string(),
            cells: vec![master("SRAM_1K", 120.0, 80.0)],
        });

        assert!(db.master("INVX1").is_some());
        assert_relative_eq!(db.master("SRAM_1K").unwrap().area().unwrap(), 9600.0);
        assert!(db.master("NAND2X1").is_none());
    }

    #[test]
    fn create_chip_is_idempotent() {
        let mut db = Database::new();
        db.create_chip("top");
        db.create_chip("other");
        assert_eq!(db.top_block().unwrap().name(), "top");
    }

    #[test]
    fn read_design_requires_chip() {
        let mut db = Database::new();
        let err = db.read_design(Path::new("missing.def")).unwrap_err();
        assert!(matches!(err, ChipDbError::NoChip));
    }

    #[test]
    fn die_area_uses_def_units() {
        let mut block = Block::new("top");
        block.die_area = Some(Rect {
            lo: Point { x: 0, y: 0 },
            hi: Point { x: 1000, y: 2000 },
        });
        // Default DEF units: 100 DBU per micron.
        assert_relative_eq!(block.die_area_um2().unwrap(), 200.0);
        block.dbu_per_micron = 1000;
        assert_relative_eq!(block.die_area_um2().unwrap(), 2.0);
        block.die_area = None;
        assert!(block.die_area_um2().is_none());
    }
}
