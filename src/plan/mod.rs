use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use crate::blocks::bank::{Bank, BankParams};
use crate::cli::progress::StepContext;
use crate::config::{ArrayKind, GeneratorOpts, SramConfig};
use crate::export::LayoutExport;
use crate::factory::Factory;
use crate::library::CellLibrary;
use crate::paths::out_json;
use crate::tech::{sky130, Pdk, TechConfig};
use crate::verification::{run_check, CheckReport, ShellRunner};

/// A concrete plan for a memory bank.
pub struct SramPlan {
    pub name: String,
    pub config: SramConfig,
    pub bank: BankParams,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskKey {
    GeneratePlan,
    GenerateLayout,
    ExportLayout,
    RunCheck,
}

pub struct ExecutePlanParams<'a> {
    pub work_dir: &'a Path,
    pub plan: &'a SramPlan,
    pub tasks: &'a HashSet<TaskKey>,
    /// Shell command run in `work_dir` once the layout is exported.
    pub check_cmd: Option<&'a str>,
    pub ctx: Option<&'a mut StepContext>,
}

/// Files produced by [`execute_plan`].
#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub layout: PathBuf,
    pub check: Option<CheckReport>,
}

pub fn generate_plan(config: &SramConfig) -> Result<SramPlan> {
    let &SramConfig {
        num_words,
        word_size,
        words_per_row,
        kind,
        ..
    } = config;

    if num_words == 0 || word_size == 0 {
        bail!("The number of words and the word size must be positive");
    }
    if words_per_row < 2 || words_per_row % 2 != 0 {
        bail!("Words per row must be a positive even number, since each sense amplifier spans two bitcell columns");
    }
    if num_words % words_per_row != 0 {
        bail!("The number of words must be a multiple of words per row");
    }

    let bank = BankParams::from_config(config)?;
    let kind = match kind {
        ArrayKind::Sram => "sram",
        ArrayKind::Cam => "cam",
    };
    Ok(SramPlan {
        name: format!("memgen_{kind}_{word_size}x{num_words}m{words_per_row}"),
        config: config.clone(),
        bank,
    })
}

macro_rules! try_finish_task {
    ( $ctx:expr, $task:expr ) => {
        if let Some(ctx) = $ctx.as_mut() {
            ctx.finish($task);
        }
    };
}

fn load_pdk(config: &SramConfig) -> Result<Pdk> {
    let tech = match config.tech.as_ref() {
        Some(path) => TechConfig::load(path)
            .with_context(|| format!("failed to load technology rules from {path:?}"))?,
        None => sky130::TECH_CONFIG.clone(),
    };
    let lib_dir = config.library.clone().unwrap_or_else(sky130::library_dir);
    let library = CellLibrary::load_dir(&lib_dir)
        .with_context(|| format!("failed to load library cells from {lib_dir:?}"))?;
    Ok(Pdk::new(tech, library))
}

pub fn execute_plan(params: ExecutePlanParams) -> Result<PlanOutput> {
    let ExecutePlanParams {
        work_dir,
        plan,
        tasks,
        check_cmd,
        mut ctx,
    } = params;

    std::fs::create_dir_all(work_dir)?;

    let pdk = load_pdk(&plan.config)?;
    let opts = GeneratorOpts {
        well_fill: plan.config.well_fill,
        ..Default::default()
    };
    let mut factory = Factory::new(pdk, opts);
    let bank = factory
        .generate::<Bank>(&plan.bank)
        .context("failed to generate layout")?;
    info!(
        "generated {} ({} x {}) from {} modules",
        bank.name(),
        bank.width(),
        bank.height(),
        factory.num_modules()
    );
    try_finish_task!(ctx, TaskKey::GenerateLayout);

    let layout = out_json(work_dir, &plan.name);
    LayoutExport::from_module(&bank)
        .save(&layout)
        .context("failed to write layout")?;
    try_finish_task!(ctx, TaskKey::ExportLayout);

    let mut check = None;
    if let (true, Some(cmd)) = (tasks.contains(&TaskKey::RunCheck), check_cmd) {
        let report = run_check(&ShellRunner, cmd, work_dir, "check")?;
        if !report.passed() {
            bail!(
                "Check `{}` failed with exit code {}; see {:?} and {:?}",
                report.command,
                report.exit_code,
                report.stdout,
                report.stderr
            );
        }
        check = Some(report);
        try_finish_task!(ctx, TaskKey::RunCheck);
    }

    Ok(PlanOutput { layout, check })
}
