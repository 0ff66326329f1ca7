use std::process::exit;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = memgen::cli::run() {
        eprintln!("{e:?}");
        exit(1);
    }
}
