use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChipDbError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing LEF: {0}")]
    Lef(#[from] lef21::LefError),

    #[error("error parsing tech LEF: {0}")]
    TechLef(#[from] crate::tech::TechLefError),

    #[error("error parsing DEF: {0}")]
    Def(#[from] crate::def::DefError),

    #[error("path is not valid UTF-8: {0:?}")]
    InvalidPath(PathBuf),

    #[error("database has no chip; create one before reading a design")]
    NoChip,
}

pub type Result<T> = std::result::Result<T, ChipDbError>;
