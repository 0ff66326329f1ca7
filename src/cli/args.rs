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
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "memgen.toml")]
    pub config: PathBuf,

    /// Directory to which output files should be saved.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Technology rule file, overriding the configuration file.
    #[arg(long)]
    pub tech: Option<PathBuf>,

    /// Directory of library cell shape files, overriding the configuration file.
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Shell command run in the output directory once the layout is written.
    #[arg(long)]
    pub check_cmd: Option<String>,
}
