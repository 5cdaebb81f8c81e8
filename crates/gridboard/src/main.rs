#![forbid(unsafe_code)]

fn main() {
    gridboard::init_tracing();
    if let Err(error) = gridboard::run_from_env() {
        eprintln!("gridboard: {error}");
        std::process::exit(error.exit_code());
    }
}
