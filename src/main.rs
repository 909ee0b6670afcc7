use clap::Parser;
use log::info;
use snafu::ErrorCompat;

mod args;
mod pipeline;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
    info!("arguments: {:?}", args);

    match pipeline::run_pipeline(&args) {
        Ok(summary) => {
            println!(
                "{} communes harmonized ({} merged), {} ballots, {} result rows",
                summary.commune_count,
                summary.duplicate_count,
                summary.ballot_count,
                summary.result_count
            );
            println!("harmonized table: {}", summary.harmonized_path);
            println!("ballot names:     {}", summary.ballots_path);
            println!("final results:    {}", summary.results_path);
        }
        Err(e) => {
            eprintln!("An error occured: {}", e);
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
