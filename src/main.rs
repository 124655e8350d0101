//! EasyPow CLI
//!
//! A command-line tool for digest pattern search and proof-of-work challenges.
//!
//! # Commands
//!
//! - `search-prefix` - Find a string whose digest starts with a bit pattern
//! - `search-suffix` - Find a string whose digest ends with a bit pattern
//! - `serve` - Issue challenges to every client that connects
//! - `solve` - Connect to a verifier and answer its challenge
//! - `solve-line` - Answer a challenge line given on the command line
//! - `benchmark` - Measure search throughput per algorithm

use clap::{Parser, Subcommand};
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use easypow::config::ProverConfig;
use easypow::engine::{self, Anchor, Pattern, TargetMask};
use easypow::{issue_challenge, respond, solve_challenge, Algorithm, LineTransport, SearchResult};

#[derive(Parser)]
#[command(name = "easypow")]
#[command(author = "EasyPow Developers")]
#[command(version)]
#[command(about = "Bit-pattern digest search and proof-of-work challenges")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Custom config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of threads to use (default: number of CPU cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a string whose digest starts with the given bits
    SearchPrefix(SearchArgs),

    /// Find a string whose digest ends with the given bits
    SearchSuffix(SearchArgs),

    /// Issue proof-of-work challenges to connecting clients
    Serve {
        /// Address to listen on (default: from config)
        #[arg(long)]
        listen: Option<String>,

        /// Required leading 1-bits (default: from config)
        #[arg(short, long)]
        bits: Option<u32>,

        /// Stop after this many exchanges
        #[arg(long)]
        max_clients: Option<usize>,
    },

    /// Connect to a verifier and answer its challenge
    Solve {
        /// Verifier address
        #[arg(long)]
        connect: String,
    },

    /// Answer a challenge line and print the response
    SolveLine {
        /// The full challenge line
        line: String,
    },

    /// Run performance benchmark
    Benchmark {
        /// Candidates per algorithm, as a power of ten
        #[arg(short, long, default_value = "6")]
        digits: usize,
    },
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Digest algorithm (md5, sha1, sha224, sha256, sha384, sha512)
    #[arg(short, long, default_value = "sha256")]
    algorithm: String,

    /// Bit pattern of '0' and '1' characters
    bits: String,

    /// Variable characters per candidate (default: from config)
    #[arg(short, long)]
    length: Option<usize>,

    /// Literal text before the variable characters
    #[arg(long, default_value = "")]
    prefix: String,

    /// Literal text after the variable characters
    #[arg(long, default_value = "")]
    suffix: String,

    /// Symbols for the variable characters (default: from config)
    #[arg(long)]
    alphabet: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("easypow=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref(), cli.threads).and_then(|config| {
        match cli.command {
            Commands::SearchPrefix(args) => cmd_search(Anchor::Prefix, args, &config),
            Commands::SearchSuffix(args) => cmd_search(Anchor::Suffix, args, &config),
            Commands::Serve {
                listen,
                bits,
                max_clients,
            } => cmd_serve(listen, bits, max_clients, &config),
            Commands::Solve { connect } => cmd_solve(&connect, &config),
            Commands::SolveLine { line } => cmd_solve_line(&line, &config),
            Commands::Benchmark { digits } => cmd_benchmark(digits, &config),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Build config from file and CLI args
fn load_config(
    path: Option<&std::path::Path>,
    threads: Option<usize>,
) -> anyhow::Result<ProverConfig> {
    let mut config = ProverConfig::load_or_default(path)?;
    if threads.is_some() {
        config.threads = threads;
    }
    Ok(config)
}

fn cmd_search(anchor: Anchor, args: SearchArgs, config: &ProverConfig) -> anyhow::Result<()> {
    let algorithm: Algorithm = args.algorithm.parse()?;
    let length = args.length.unwrap_or(config.variable_length);
    let alphabet = args.alphabet.as_deref().unwrap_or(&config.alphabet);

    let target = TargetMask::from_bits(&args.bits, anchor, algorithm.output_len())?;
    let pattern = Pattern::compile(
        args.prefix.as_bytes(),
        length,
        args.suffix.as_bytes(),
        alphabet.as_bytes(),
    )?;

    let num_threads = config.threads.unwrap_or_else(num_cpus::get);
    let progress = Arc::new(AtomicU64::new(0));
    let search_config = engine::SearchConfig {
        threads: Some(num_threads),
        progress: Some(Arc::clone(&progress)),
        ..engine::SearchConfig::default()
    };

    println!("Algorithm: {}", algorithm);
    println!("Pattern:   {} ({:?})", args.bits, anchor);
    println!("Space:     {} candidates", pattern.space_size());
    println!("Threads:   {}", num_threads);

    let start = Instant::now();
    let handle = std::thread::spawn(move || {
        engine::search(&pattern, &target, algorithm.digest_fn(), &search_config)
    });

    // Report hashrate while workers run
    let mut last_report = Instant::now();
    while !handle.is_finished() {
        std::thread::sleep(Duration::from_millis(100));
        if last_report.elapsed() >= Duration::from_secs(2) {
            let hashes = progress.load(std::sync::atomic::Ordering::Relaxed);
            let elapsed = start.elapsed().as_secs_f64();
            print!(
                "\rHashrate: {:.0} H/s | Hashes: {} | Time: {:.0}s",
                hashes as f64 / elapsed,
                hashes,
                elapsed
            );
            std::io::stdout().flush().ok();
            last_report = Instant::now();
        }
    }

    let result = handle
        .join()
        .map_err(|_| anyhow::anyhow!("search thread panicked"))??;
    let hashes = progress.load(std::sync::atomic::Ordering::Relaxed);
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        SearchResult::Found(found) => {
            println!("\n\nFound!");
            println!("  Input:  {}", String::from_utf8_lossy(&found));
            println!("  Digest: {}", hex::encode(algorithm.digest(&found)));
            println!("  Hashes: {} ({:.0} H/s)", hashes, hashes as f64 / elapsed);
        }
        SearchResult::Exhausted => {
            println!("\n\nSearch space exhausted after {} hashes", hashes);
        }
        SearchResult::Cancelled => {
            println!("\n\nSearch cancelled after {} hashes", hashes);
        }
    }

    Ok(())
}

fn cmd_serve(
    listen: Option<String>,
    bits: Option<u32>,
    max_clients: Option<usize>,
    config: &ProverConfig,
) -> anyhow::Result<()> {
    let addr = listen.unwrap_or_else(|| config.listen.clone());
    let bits = bits.unwrap_or(config.bits);
    let listener = TcpListener::bind(&addr)?;

    info!(addr = %listener.local_addr()?, bits, "verifier listening");

    let mut served = 0usize;
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // One exchange per connection; failures only end that connection
        if let Err(e) = stream.set_read_timeout(config.read_timeout()) {
            warn!(%peer, error = %e, "failed to set read timeout");
            continue;
        }
        let mut transport = match LineTransport::tcp(stream) {
            Ok(transport) => transport,
            Err(e) => {
                warn!(%peer, error = %e, "failed to open connection");
                continue;
            }
        };

        match issue_challenge(bits, &mut transport) {
            Ok(accepted) => info!(%peer, accepted, "exchange complete"),
            Err(e) => warn!(%peer, error = %e, "exchange failed"),
        }

        served += 1;
        if max_clients.is_some_and(|max| served >= max) {
            break;
        }
    }

    Ok(())
}

fn cmd_solve(addr: &str, config: &ProverConfig) -> anyhow::Result<()> {
    let stream = TcpStream::connect(addr)?;
    let mut transport = LineTransport::tcp(stream)?;

    let start = Instant::now();
    let accepted = respond(&mut transport, &config.search_config())?;

    println!("{}", if accepted { "OK" } else { "NG" });
    info!(elapsed_ms = start.elapsed().as_millis() as u64, accepted, "challenge answered");

    if !accepted {
        anyhow::bail!("Verifier rejected the response");
    }
    Ok(())
}

fn cmd_solve_line(line: &str, config: &ProverConfig) -> anyhow::Result<()> {
    let response = solve_challenge(line.as_bytes(), &config.search_config())?;
    println!("{}", String::from_utf8_lossy(&response));
    Ok(())
}

fn cmd_benchmark(digits: usize, config: &ProverConfig) -> anyhow::Result<()> {
    let num_threads = config.threads.unwrap_or_else(num_cpus::get);
    println!(
        "Running benchmark with 10^{} candidates per algorithm on {} threads...",
        digits, num_threads
    );

    // A fully masked all-zero digest: the whole space gets scanned
    let pattern = Pattern::compile(b"easypow-benchmark-", digits, b"", b"0123456789")?;
    let search_config = engine::SearchConfig::with_threads(num_threads);

    println!("\nResults:");
    for algorithm in Algorithm::ALL {
        let len = algorithm.output_len();
        let target = TargetMask::new(vec![0; len], vec![0xFF; len])?;

        let start = Instant::now();
        engine::search(&pattern, &target, algorithm.digest_fn(), &search_config)?;
        let elapsed = start.elapsed();

        let hashrate = pattern.space_size() as f64 / elapsed.as_secs_f64();
        println!(
            "  {:<7} {:>12.0} H/s  ({:.2}s)",
            algorithm.name(),
            hashrate,
            elapsed.as_secs_f64()
        );
    }

    Ok(())
}
