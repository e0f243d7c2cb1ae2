//! List the framed records of Paradopp binary files without decoding them.

use std::path::PathBuf;

use clap::{AppSettings, Parser};

use continental::read::Records;

#[derive(Parser)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_long_args = true)]
struct Args {
    /// The files to be listed.
    #[clap(required = true)]
    files: Vec<PathBuf>,

    /// Only print the configuration records and a count of the data records.
    #[clap(short, long)]
    summary: bool,
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), String> {
    let args = Args::parse();
    match list_files(&args.files, args.summary) {
        0 => Ok(()),
        n => Err(format!(
            "{n} of {} files are unreadable or malformed",
            args.files.len()
        )),
    }
}

/// Print the records of every file, carrying on past bad files. Returns the
/// number of files that couldn't be read or framed.
fn list_files(files: &[PathBuf], summary: bool) -> usize {
    let mut num_failed = 0;
    for file in files {
        let buf = match std::fs::read(file) {
            Ok(buf) => buf,
            Err(e) => {
                num_failed += 1;
                eprintln!("{}: {e}", file.display());
                continue;
            }
        };
        println!("{} ({} bytes)", file.display(), buf.len());

        let mut num_data = 0;
        for record in Records::new(&buf) {
            match record {
                Ok(r) => {
                    if !r.kind.is_header() {
                        num_data += 1;
                        if summary {
                            continue;
                        }
                    }
                    println!(
                        "{:>10}  {:#04x}  {:<22} {:>5} bytes",
                        r.offset,
                        r.kind.id(),
                        format!("{:?}", r.kind),
                        r.len()
                    );
                }
                Err(e) => {
                    num_failed += 1;
                    println!("  {e}");
                }
            }
        }
        println!("  {num_data} data records");
    }
    num_failed
}
