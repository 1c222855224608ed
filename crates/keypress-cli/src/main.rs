#![forbid(unsafe_code)]

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(keypress_cli::logging::env_filter())
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = keypress_cli::run_from_env() {
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}
