use std::path::{Path, PathBuf};

pub fn out_report(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.report.json"))
}
