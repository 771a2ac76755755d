//! FluxProf command-line binary.

fn main() {
    if let Err(e) = fluxprof_cli::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
