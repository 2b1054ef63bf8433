//! Technology-LEF reader.
//!
//! Extracts the layer table (name, type, preferred direction, pitch, width)
//! and skips everything else a technology file carries: units, via and via
//! rule definitions, sites, spacing tables, and vendor properties.

use std::path::Path;

use arcstr::ArcStr;
use thiserror::Error;

use crate::db::{Layer, LayerDirection, LayerKind, Tech};
use crate::lex::TokenStream;

#[derive(Debug, Error)]
pub enum TechLefError {
    #[error("line {0}: malformed LAYER statement")]
    Malformed(usize),

    #[error("unexpected end of file in LAYER {0}")]
    UnterminatedLayer(String),
}

/// Reads a technology LEF file, appending its layers to `tech`. Returns the
/// number of layers added.
pub fn read_tech_lef(path: &Path, tech: &mut Tech) -> crate::error::Result<usize> {
    let src = std::fs::read_to_string(path)?;
    Ok(scan(&src, tech)?)
}

pub fn scan(src: &str, tech: &mut Tech) -> Result<usize, TechLefError> {
    let mut ts = TokenStream::new(src);
    let mut added = 0;
    while let Some(tok) = ts.bump() {
        if tok.text.eq_ignore_ascii_case("LAYER") {
            let name = ts.bump().ok_or(TechLefError::Malformed(tok.line))?;
            if let Some(layer) = scan_layer(&mut ts, &name.text)? {
                tech.layers.push(layer);
                added += 1;
            }
        }
        // Anything that is not a LAYER definition is skipped. Quoted property
        // values are single tokens, so embedded `;` cannot derail the scan.
    }
    Ok(added)
}

/// Scans one LAYER section. Returns `None` for `LAYER <name> ;` geometry
/// references (as found in macro pins and obstructions), which are not layer
/// definitions.
fn scan_layer(ts: &mut TokenStream, name: &str) -> Result<Option<Layer>, TechLefError> {
    if let Some(next) = ts.peek() {
        if next.text == ";" {
            ts.bump();
            return Ok(None);
        }
    }

    let mut layer = Layer {
        name: ArcStr::from(name),
        kind: LayerKind::Other,
        direction: None,
        pitch: None,
        width: None,
    };

    loop {
        let tok = ts
            .bump()
            .ok_or_else(|| TechLefError::UnterminatedLayer(name.to_string()))?;
        let kw = tok.text.to_ascii_uppercase();
        match kw.as_str() {
            "END" => {
                let end = ts
                    .bump()
                    .ok_or_else(|| TechLefError::UnterminatedLayer(name.to_string()))?;
                if end.text != name {
                    return Err(TechLefError::Malformed(end.line));
                }
                break;
            }
            "TYPE" => {
                let val = ts.bump().ok_or(TechLefError::Malformed(tok.line))?;
                layer.kind = match val.text.to_ascii_uppercase().as_str() {
                    "ROUTING" => LayerKind::Routing,
                    "CUT" => LayerKind::Cut,
                    "MASTERSLICE" => LayerKind::Masterslice,
                    "OVERLAP" => LayerKind::Overlap,
                    "IMPLANT" => LayerKind::Implant,
                    _ => LayerKind::Other,
                };
                skip_to_semi(ts, name)?;
            }
            "DIRECTION" => {
                let val = ts.bump().ok_or(TechLefError::Malformed(tok.line))?;
                layer.direction = match val.text.to_ascii_uppercase().as_str() {
                    "HORIZONTAL" => Some(LayerDirection::Horizontal),
                    "VERTICAL" => Some(LayerDirection::Vertical),
                    _ => None,
                };
                skip_to_semi(ts, name)?;
            }
            "PITCH" => {
                let val = ts.bump().ok_or(TechLefError::Malformed(tok.line))?;
                layer.pitch = val.text.parse().ok();
                skip_to_semi(ts, name)?;
            }
            "WIDTH" => {
                let val = ts.bump().ok_or(TechLefError::Malformed(tok.line))?;
                layer.width = val.text.parse().ok();
                skip_to_semi(ts, name)?;
            }
            _ => skip_to_semi(ts, name)?,
        }
    }
    Ok(Some(layer))
}

fn skip_to_semi(ts: &mut TokenStream, layer: &str) -> Result<(), TechLefError> {
    loop {
        let tok = ts
            .bump()
            .ok_or_else(|| TechLefError::UnterminatedLayer(layer.to_string()))?;
        if tok.text == ";" {
            return Ok(());
        }
    }
}
