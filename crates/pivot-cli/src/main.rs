#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = pivot_cli::run_from_env() {
        eprintln!("pivot: {error}");
        std::process::exit(error.exit_code());
    }
}
