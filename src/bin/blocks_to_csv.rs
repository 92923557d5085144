//! Flatten per-page JSON models into one CSV row per sentence.
//!
//! Usage:
//!   blocks_to_csv out/output_paper/json --csv export_blocks.csv

use clap::Parser;
use page_oxide::export::blocks_csv::json_dir_to_csv;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "blocks_to_csv",
    about = "Export block sentences and their translation flags as CSV"
)]
struct Args {
    /// Directory containing page_<N>.json files
    json_dir: PathBuf,

    /// Output CSV path
    #[arg(long, default_value = "export_blocks.csv")]
    csv: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    match json_dir_to_csv(&args.json_dir, &args.csv) {
        Ok(rows) => println!("Wrote {} rows to {}", rows, args.csv.display()),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        },
    }
}
