//! Cell-library import.
//!
//! Parsing is delegated to [`lef21`]; this module only converts the parsed
//! library into the database's [`Lib`]/[`Master`] form.

use std::path::Path;

use arcstr::ArcStr;
use rust_decimal::prelude::ToPrimitive;

use crate::db::{Lib, Master};
use crate::error::{ChipDbError, Result};

pub fn read_lef(path: &Path) -> Result<Lib> {
    let fname = path
        .to_str()
        .ok_or_else(|| ChipDbError::InvalidPath(path.to_path_buf()))?;
    let lef = lef21::LefLibrary::open(fname)?;
    Ok(from_lef(path, &lef))
}

fn from_lef(path: &Path, lef: &lef21::LefLibrary) -> Lib {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lib".to_string());
    let cells = lef
        .macros
        .iter()
        .map(|m| Master {
            name: ArcStr::from(m.name.as_str()),
            width: m.size.as_ref().and_then(|s| s.0.to_f64()),
            height: m.size.as_ref().and_then(|s| s.1.to_f64()),
            pins: m.pins.len(),
        })
        .collect();
    Lib { name, cells }
}
