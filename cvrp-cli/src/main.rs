//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = cvrp_cli::run() {
        eprintln!("cvrp: {err}");
        std::process::exit(1);
    }
}
