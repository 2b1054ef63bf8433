pub mod design;

pub use design::{parse_design_config, DesignConfig};
