use std::collections::HashSet;
use std::fmt::Display;
use std::time::Duration;

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::warn;

use crate::plan::TaskKey;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Pending,
    InProgress,
    Disabled,
    Skipped,
    Failed,
}

/// Terminal progress for the steps of a generator run.
pub struct StepContext {
    step_num: usize,
    steps: Vec<Step>,
}

pub struct Step {
    desc: &'static str,
    key: TaskKey,
    progress_bar: ProgressBar,
    disabled: bool,
}

impl Step {
    fn new(desc: &'static str, key: TaskKey, disabled: bool) -> Self {
        Self {
            desc,
            key,
            progress_bar: ProgressBar::new_spinner(),
            disabled,
        }
    }
}

impl StepContext {
    pub fn new(tasks: &HashSet<TaskKey>) -> Self {
        println!("Tasks:");

        let mut steps = vec![
            Step::new("Generate plan", TaskKey::GeneratePlan, false),
            Step::new("Generate layout", TaskKey::GenerateLayout, false),
            Step::new("Export layout", TaskKey::ExportLayout, false),
            Step::new(
                "Run check",
                TaskKey::RunCheck,
                !tasks.contains(&TaskKey::RunCheck),
            ),
        ];
        let mp = MultiProgress::new();
        let num_steps = steps.iter().filter(|step| !step.disabled).count();
        let width = format!("{num_steps}").len();
        let mut counter = 0;
        for (i, step) in steps.iter_mut().enumerate() {
            mp.insert(i + 1, step.progress_bar.clone());
            if step.disabled {
                let msg = format!("[-/-] {}", step.desc);
                step.set_status(StepStatus::Disabled, Some(msg));
            } else {
                counter += 1;
                let msg = format!("[{counter:width$}/{num_steps:width$}] {}", step.desc);
                step.set_status(StepStatus::Pending, Some(msg));
            }
        }
        if let Some(first) = steps.first_mut() {
            first.set_status(StepStatus::InProgress, None);
        }
        Self { step_num: 0, steps }
    }

    pub fn advance(&mut self) {
        self.step_num += 1;
        while let Some(current_step) = self.current_step() {
            if !current_step.disabled {
                break;
            }
            self.step_num += 1;
        }
    }

    #[inline]
    pub fn current_step(&mut self) -> Option<&mut Step> {
        self.steps.get_mut(self.step_num)
    }

    /// Marks the current step failed and the rest skipped if `res` is an error.
    pub fn check<T>(&mut self, res: anyhow::Result<T>) -> anyhow::Result<T> {
        if res.is_err() {
            if let Some(current_step) = self.current_step() {
                current_step.set_status(StepStatus::Failed, None);
                self.advance();
                while let Some(current_step) = self.current_step() {
                    current_step.set_status(StepStatus::Skipped, None);
                    self.advance();
                }
            }
            println!("\n");
        }
        res
    }

    pub fn finish(&mut self, key: TaskKey) {
        let Some(current_step) = self.current_step() else {
            warn!("step {key:?} finished after all steps completed");
            return;
        };
        if current_step.key != key {
            warn!("step {key:?} finished out of order");
            return;
        }
        current_step.set_status(StepStatus::Done, None);
        self.advance();

        if let Some(current_step) = self.current_step() {
            current_step.set_status(StepStatus::InProgress, None);
        } else {
            self.done();
        }
    }

    pub fn done(&mut self) {
        println!("\n\nCompleted all tasks");
    }
}

fn format_template(spinner: bool, status: impl Display) -> String {
    if spinner {
        format!("{{spinner:.green}} {status:16} {{msg}}")
    } else {
        format!("  {status:16} {{msg}}")
    }
}

impl Step {
    fn set_status(&mut self, status: StepStatus, msg: Option<String>) {
        let template = match status {
            StepStatus::Disabled => {
                format_template(false, "Disabled".truecolor(120, 120, 120).bold())
            }
            StepStatus::Done => format_template(false, "Done".green().bold()),
            StepStatus::Failed => format_template(false, "Failed".bright_white().on_red().bold()),
            StepStatus::InProgress => format_template(true, "In Progress".bright_white().bold()),
            StepStatus::Pending => format_template(true, "Pending".blue().bold()),
            StepStatus::Skipped => format_template(false, "Skipped".yellow().bold()),
        };
        let style =
            ProgressStyle::with_template(&template).unwrap_or_else(|_| ProgressStyle::default_spinner());
        self.progress_bar.set_style(style);

        if let Some(msg) = msg {
            self.progress_bar.set_message(msg);
        }

        if status == StepStatus::InProgress {
            self.progress_bar
                .enable_steady_tick(Duration::from_millis(200));
        } else if status != StepStatus::Pending {
            self.progress_bar.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_steps_are_skipped() {
        let mut ctx = StepContext::new(&HashSet::new());
        ctx.finish(TaskKey::GeneratePlan);
        ctx.finish(TaskKey::GenerateLayout);
        assert_eq!(ctx.current_step().map(|s| s.key), Some(TaskKey::ExportLayout));
        ctx.finish(TaskKey::ExportLayout);
        assert!(ctx.current_step().is_none());
    }

    #[test]
    fn test_failure_skips_remaining_steps() {
        let tasks = HashSet::from([TaskKey::RunCheck]);
        let mut ctx = StepContext::new(&tasks);
        ctx.finish(TaskKey::GeneratePlan);
        let res: anyhow::Result<()> = ctx.check(Err(anyhow::anyhow!("boom")));
        assert!(res.is_err());
        assert!(ctx.current_step().is_none());
    }
}
