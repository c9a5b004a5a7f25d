//! kddlab: NSL-KDD intrusion dataset analysis CLI

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use kddlab::cli::{load_config, read_input, run_download, run_job, Cli, Commands};
use kddlab::report::JobExport;
use kddlab::utils::{
    print_banner, print_completion, print_config, print_info, print_step_header, print_success,
    print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Download {
        split,
        store,
        output,
    } = &cli.command
    {
        return run_download(*split, store, output.as_deref());
    }

    let Some(args) = cli.command.job_args() else {
        return Ok(());
    };
    let job = cli.command.name();
    let quiet = args.quiet;
    let config = load_config(args)?;

    if !quiet {
        print_banner(env!("CARGO_PKG_VERSION"));
        print_config(job, &args.input, args.output.as_deref(), &config);
        if args.config.is_none() {
            print_info("Using default job configuration");
        }
    }

    // Step 1: read input
    let start = Instant::now();
    if !quiet {
        print_step_header(1, "Load Input");
    }
    let bytes = read_input(&args.input)?;
    if !quiet {
        print_success(&format!(
            "Read {:.2} KB from {}",
            bytes.len() as f64 / 1024.0,
            args.input.display()
        ));
        print_step_header(2, "Run Job");
    }

    // Step 2: run the job
    let Some(report) = run_job(&cli.command, &bytes, &config, quiet)? else {
        return Ok(());
    };

    // Step 3: emit the result
    match &args.output {
        Some(path) => {
            if !quiet && path.exists() {
                print_warning(&format!("Overwriting {}", path.display()));
            }
            JobExport::new(job, &args.input, &config, &report).write(path)?;
            if !quiet {
                report.display();
                print_success(&format!("Saved result to {}", path.display()));
            }
        }
        None => {
            if quiet {
                let json = serde_json::to_string(&report).context("Failed to serialize job result")?;
                println!("{}", json);
            } else {
                report.display();
                let json =
                    serde_json::to_string_pretty(&report).context("Failed to serialize job result")?;
                println!();
                println!("{}", json);
            }
        }
    }

    if !quiet {
        if let Commands::Split { store: Some(dir), .. } = &cli.command {
            print_info(&format!("Splits persisted under {}", dir.display()));
        }
        println!(
            "    {} {}",
            style("⏱").dim(),
            style(format!("{:.2?}", start.elapsed())).dim()
        );
        print_completion(job);
    }

    Ok(())
}
