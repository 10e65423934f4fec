use clap::Parser;
use dvdbnd::cli::{self, Cli};

fn main() {
    env_logger::init();

    let args = Cli::parse();
    if let Err(e) = cli::run(args) {
        eprintln!("an error occurred: {e}");
        std::process::exit(1);
    }
}
