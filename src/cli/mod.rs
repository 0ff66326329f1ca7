use std::collections::HashSet;
use std::fs::canonicalize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::args::Args;
use crate::cli::progress::StepContext;
use crate::config::parse_sram_config;
use crate::plan::{execute_plan, generate_plan, ExecutePlanParams, TaskKey};

pub mod args;
pub mod progress;

pub const BANNER: &str = r"
 _ __ ___   ___ _ __ ___   __ _  ___ _ __
| '_ ` _ \ / _ \ '_ ` _ \ / _` |/ _ \ '_ \
| | | | | |  __/ | | | | | (_| |  __/ | | |
|_| |_| |_|\___|_| |_| |_|\__, |\___|_| |_|
                          |___/
";

pub fn run() -> Result<()> {
    let args = Args::parse();

    let config_path = canonicalize(&args.config)
        .with_context(|| format!("configuration file {:?} not found", args.config))?;

    println!("{BANNER}");
    println!("memgen v{}\n", env!("CARGO_PKG_VERSION"));

    println!("Reading configuration file...\n");
    let mut config = parse_sram_config(&config_path)?;
    if args.tech.is_some() {
        config.tech = args.tech;
    }
    if args.library.is_some() {
        config.library = args.library;
    }

    println!("Configuration file: {:?}", &config_path);
    println!("Memory parameters:");
    println!("\tKind: {:?}", config.kind);
    println!("\tNumber of words: {}", config.num_words);
    println!("\tWord size: {}", config.word_size);
    println!("\tWords per row: {}", config.words_per_row);
    println!("\tWell fill: {}\n", config.well_fill);

    let mut tasks = HashSet::from([TaskKey::GenerateLayout, TaskKey::ExportLayout]);
    if args.check_cmd.is_some() {
        tasks.insert(TaskKey::RunCheck);
    }

    let mut ctx = StepContext::new(&tasks);

    let plan = ctx.check(generate_plan(&config))?;
    ctx.finish(TaskKey::GeneratePlan);

    let work_dir = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(plan.name.as_str()));
    std::fs::create_dir_all(&work_dir)?;
    let work_dir = canonicalize(work_dir)?;

    let res = execute_plan(ExecutePlanParams {
        work_dir: &work_dir,
        plan: &plan,
        tasks: &tasks,
        check_cmd: args.check_cmd.as_deref(),
        ctx: Some(&mut ctx),
    });

    let output = ctx.check(res)?;
    println!("Layout saved to: {:?}", &output.layout);
    if let Some(report) = output.check {
        println!("Check passed; log saved to: {:?}", &report.stdout);
    }
    println!("Artifacts saved to: {:?}\n", &work_dir);

    Ok(())
}
