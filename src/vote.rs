use std::{
    error::Error,
    fs,
    io::{ self, Read },
    path::PathBuf,
    process::ExitCode,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use quantum_voting::{
    config::{ EmptyPolicy, EncodeConfig, Election, GapPolicy },
    roster::Roster,
    sim::{ Backend, StateVectorBackend },
};

#[derive(Parser, Debug)]
#[command(name = "vote")]
#[command(about = "Encode ranked ballots as qubit states and sample the voting circuit")]
struct Args {
    /// Candidate roster (comma-separated; size must be a power of two)
    #[arg(long, value_delimiter = ',', default_value = "a,b,c,d,e,f,g,h")]
    candidates: Vec<String>,

    /// A voter's ranking, e.g. "a>b=c>d" (repeatable)
    #[arg(short, long)]
    ranking: Vec<String>,

    /// File with one ranking per line; '#' starts a comment, '-' reads stdin
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of measurement samples
    #[arg(long, default_value_t = 1024)]
    shots: usize,

    /// Random seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Reject unknown or repeated candidates, empty rank groups, and empty rankings
    #[arg(long)]
    strict: bool,

    /// Treat an empty ranking as all candidates tied
    #[arg(long, conflicts_with = "strict")]
    uniform_empty: bool,

    /// Drop empty rank groups ("a>>b") instead of letting them hold a rank
    #[arg(long, conflicts_with = "strict")]
    skip_gaps: bool,

    /// Print the assembled circuit
    #[arg(long)]
    draw: bool,

    /// Write the qubit coupling graph in dot format to this path
    #[arg(long)]
    graphviz: Option<PathBuf>,

    /// Print the pre-measurement state vector
    #[arg(long)]
    statevector: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter
        = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_rankings(args: &Args) -> io::Result<Vec<String>> {
    let mut rankings = args.ranking.clone();
    let text = match &args.file {
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Some(buf)
        },
        Some(path) => Some(fs::read_to_string(path)?),
        None => None,
    };
    if let Some(text) = text {
        rankings.extend(
            text.lines()
                .map(|line| line.split('#').next().unwrap_or("").trim())
                .filter(|line| !line.is_empty())
                .map(String::from)
        );
    }
    Ok(rankings)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let roster = Roster::new(args.candidates.iter().cloned())?;
    let config
        = if args.strict {
            EncodeConfig::strict()
        } else {
            EncodeConfig {
                empty: if args.uniform_empty { EmptyPolicy::Uniform } else { EmptyPolicy::Reject },
                gaps: if args.skip_gaps { GapPolicy::Skip } else { GapPolicy::Count },
                ..Default::default()
            }
        };
    let election = Election::with_config(roster, config);
    let rankings = read_rankings(&args)?;
    info!(voters = rankings.len(), roster = %election.roster(), "collected ballots");

    let circuit = election.circuit_from_rankings(&rankings)?;
    if args.draw { println!("{}\n", circuit); }
    if let Some(path) = &args.graphviz {
        circuit.save_graphviz("voting_circuit", path)?;
        info!(path = %path.display(), "wrote coupling graph");
    }

    let mut backend = StateVectorBackend::new(args.seed);
    let result = backend.run(circuit, args.shots)?;
    if args.statevector {
        for (k, a) in result.statevector.iter().enumerate() {
            if a.norm_sqr() > 1e-12 { println!("{:>6}: {:.6}", k, a); }
        }
        println!();
    }
    println!("{}", result.counts);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        },
    }
}
