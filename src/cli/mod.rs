use std::collections::HashSet;
use std::fs::canonicalize;

use anyhow::bail;
use clap::Parser;
use colored::Colorize;

use crate::cli::args::Args;
use crate::cli::progress::StepContext;
use crate::config::{parse_design_config, DesignConfig};
use crate::loader::{load_design, LoadParams, TaskKey};
use crate::paths::out_report;
use crate::summary::{summarize, write_report};
use crate::Result;

pub mod args;
pub mod progress;

pub const BANNER: &str = r"
  ____  _   _  ___  ____   ____   ____
 / ___|| | | ||_ _||  _ \ |  _ \ | __ )
| |    | |_| | | | | |_) || | | ||  _ \
| |___ |  _  | | | |  __/ | |_| || |_) |
 \____||_| |_||___||_|    |____/ |____/

CHIPDB v0.1
";

pub fn run() -> Result<()> {
    let args = Args::parse();

    println!("{BANNER}");

    let mut config = match &args.config {
        Some(path) => {
            let path = canonicalize(path)?;
            println!("Reading configuration file...\n");
            println!("Configuration file: {:?}", &path);
            parse_design_config(&path)?
        }
        None => DesignConfig::default(),
    };
    args.apply(&mut config);

    let Some(design) = config.design.clone() else {
        bail!("no design file specified; pass --design or set `design` in the configuration file");
    };

    println!("Input files:");
    println!("\tDesign (DEF): {design:?}");
    for path in &config.lef {
        println!("\tCell LEF: {path:?}");
    }
    for path in &config.tech_lef {
        println!("\tTech LEF: {path:?}");
    }
    if let Some(path) = &config.sdc {
        println!("\tConstraints (SDC, unused): {path:?}");
    }
    if let Some(path) = &config.spef {
        println!("\tParasitics (SPEF, unused): {path:?}");
    }
    for path in &config.liberty {
        println!("\tTiming models (Liberty, unused): {path:?}");
    }
    println!();

    let mut tasks = HashSet::from([TaskKey::ReadLef, TaskKey::ReadTechLef, TaskKey::ReadDesign]);
    if args.output_dir.is_some() {
        tasks.insert(TaskKey::WriteReport);
    }
    let mut ctx = StepContext::new(&tasks);

    let (db, report) = load_design(LoadParams {
        config: &config,
        ctx: Some(&mut ctx),
    });

    let failed = report.failed().count();
    if failed > 0 {
        println!(
            "{} {} of {} input files failed to load",
            "warning:".yellow().bold(),
            failed,
            report.outcomes.len()
        );
        if args.strict {
            bail!("Failed to load design: {failed} input file(s) did not load");
        }
    }

    let Some(block) = db.top_block() else {
        bail!("Failed to get top block");
    };

    println!("{}", "Design loaded successfully".green().bold());
    let summary = summarize(&db, block);
    println!("{summary}");

    if let Some(output_dir) = &args.output_dir {
        std::fs::create_dir_all(output_dir)?;
        let path = out_report(output_dir, block.name());
        ctx.check(write_report(&path, &summary, &report))?;
        ctx.finish(TaskKey::WriteReport);
        println!("Report saved to: {:?}", &path);
    }

    Ok(())
}
