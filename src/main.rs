use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ferrous_amplicon::amplicon::load_amplicons;
use ferrous_amplicon::amplicon_opt::{AlignCliOptions, AmpliconOpt};
use ferrous_amplicon::pipeline::{AlignJob, run_alignment};

#[derive(Parser)]
#[command(name = "ferrous-amplicon")]
#[command(about = "FerrousAmplicon - merge and align amplicon read pairs to their amplicon references", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge read pairs and align them to their amplicons
    Align(AlignCliOptions),

    /// Parse an amplicon list and print the resolved templates
    Amplicons {
        /// Tab-separated amplicon list
        #[arg(value_name = "AMPLICONS")]
        amplicons: PathBuf,
    },
}

fn init_logger(verbosity: i32) {
    // 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn configure_threads(threads: Option<usize>) -> usize {
    let mut num_threads = threads.unwrap_or_else(num_cpus::get);

    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", num_threads);
        num_threads = 1;
    }

    let max_threads = num_cpus::get() * 2;
    if num_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            num_threads,
            max_threads,
            max_threads
        );
        num_threads = max_threads;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(_) => {
            log::debug!(
                "Successfully built global Rayon thread pool with {} threads",
                num_threads
            );
        }
        Err(e) => {
            log::warn!(
                "Failed to configure thread pool: {} (may already be initialized)",
                e
            );
        }
    }

    let thread_word = if num_threads == 1 {
        "thread"
    } else {
        "threads"
    };
    log::info!("Using {} {}", num_threads, thread_word);

    num_threads
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Amplicons { amplicons } => {
            init_logger(3);

            let list = match load_amplicons(&amplicons) {
                Ok(list) => list,
                Err(e) => {
                    log::error!("{:#}", e);
                    std::process::exit(1);
                }
            };

            for line in &list.sam_headers {
                println!("{}", line);
            }
            for t in &list.templates {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    t.id,
                    t.chrom,
                    t.position,
                    t.strand.symbol(),
                    t.reference.len(),
                    String::from_utf8_lossy(&t.left_primer),
                    String::from_utf8_lossy(&t.right_primer)
                );
            }
        }

        Commands::Align(args) => {
            init_logger(args.verbosity);

            let mut opt = AmpliconOpt::from_cli(&args);
            opt.n_threads = configure_threads(args.threads);

            if let Err(errors) = opt.validate() {
                for e in errors {
                    log::error!("{}", e);
                }
                std::process::exit(1);
            }

            if opt.verbosity >= 3 {
                log::info!("Reconciliation parameters:");
                log::info!("  Min insert size: {}", opt.min_insert_size);
                log::info!("  Max mismatch fraction: {}", opt.max_mismatch_fraction);
                log::info!(
                    "  Clip min score: {}, Merge min score: {}",
                    opt.clip_min_score,
                    opt.merge_min_score
                );
                log::info!("  Batch size: {} pairs", opt.batch_size);
            }

            let job = AlignJob {
                amplicons: args.amplicons,
                read1: args.read1,
                read2: args.read2,
                prefix: args.prefix,
                command_line: std::env::args().collect::<Vec<_>>().join(" "),
            };

            if let Err(e) = run_alignment(&job, &opt) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }
}
