use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about,
    help_template(
        "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
    )
)]
pub struct Args {
    /// Path to TOML configuration file listing the input files.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Placed/routed design (DEF). Overrides the configuration file.
    #[arg(short, long)]
    pub design: Option<PathBuf>,

    /// Cell library LEF file. May be repeated; overrides the configuration file.
    #[arg(long = "lef", value_name = "FILE")]
    pub lef: Vec<PathBuf>,

    /// Technology LEF file. May be repeated; overrides the configuration file.
    #[arg(long = "tech-lef", value_name = "FILE")]
    pub tech_lef: Vec<PathBuf>,

    /// Timing constraints (SDC). Accepted but not yet read.
    #[arg(long, value_name = "FILE")]
    pub sdc: Option<PathBuf>,

    /// Parasitics (SPEF). Accepted but not yet read.
    #[arg(long, value_name = "FILE")]
    pub spef: Option<PathBuf>,

    /// Cell timing models (Liberty). May be repeated. Accepted but not yet read.
    #[arg(long = "liberty", value_name = "FILE")]
    pub liberty: Vec<PathBuf>,

    /// Directory to which the JSON load report should be saved.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Exit with an error if any input file fails to load.
    #[arg(long)]
    pub strict: bool,
}

impl Args {
    /// Applies command-line overrides on top of a configuration file.
    pub fn apply(&self, config: &mut crate::config::DesignConfig) {
        if let Some(design) = &self.design {
            config.design = Some(design.clone());
        }
        if !self.lef.is_empty() {
            config.lef = self.lef.clone();
        }
        if !self.tech_lef.is_empty() {
            config.tech_lef = self.tech_lef.clone();
        }
        if !self.liberty.is_empty() {
            config.liberty = self.liberty.clone();
        }
        if let Some(sdc) = &self.sdc {
            config.sdc = Some(sdc.clone());
        }
        if let Some(spef) = &self.spef {
            config.spef = Some(spef.clone());
        }
    }
}
