use chrono::Local;
use clap::Parser;
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use saturnlib::{
    cnf::clausify,
    proofs::GraphvizMode,
    selection::SelectionStrategy,
    superposition::{
        LimitReason, ResourceLimitConfig, Saturation, SaturationConfig, SaturationResult,
    },
    term_bank::TermBank,
    tptp_parser,
};

/// Saturate a TPTP problem
#[derive(Parser)]
struct Cli {
    /// Path to a tptp problem file
    file: PathBuf,

    /// Wall clock limit for the search in seconds
    #[arg(long)]
    time_limit: Option<u64>,

    /// Memory limit of the whole process in mebibytes
    #[arg(long)]
    memory_limit: Option<usize>,

    /// Stop after this many given clause iterations
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Literal selection strategy
    #[arg(long, value_enum, default_value = "max-neg")]
    selection: SelectionStrategy,

    /// Lock the axioms in the set of support pool and saturate from the goal clauses
    #[arg(long)]
    set_of_support: bool,

    /// Every age_weight_ratio + 1-th given clause is picked by age instead of weight
    #[arg(long, default_value_t = 4)]
    age_weight_ratio: u32,

    /// Print a graphviz rendering of the derivation after the run
    #[arg(long, value_enum)]
    proof_graph: Option<GraphvizMode>,

    /// Write the proof graph to this file instead of stdout
    #[arg(long)]
    proof_file: Option<PathBuf>,
}

fn szs_status(result: &SaturationResult, refuting_conjecture: bool) -> &'static str {
    match result {
        SaturationResult::Unsat(_) => {
            if refuting_conjecture {
                "Theorem"
            } else {
                "Unsatisfiable"
            }
        }
        SaturationResult::Sat => {
            if refuting_conjecture {
                "CounterSatisfiable"
            } else {
                "Satisfiable"
            }
        }
        SaturationResult::Timeout(LimitReason::Time) => "Timeout",
        SaturationResult::Timeout(LimitReason::Memory) => "MemoryOut",
        SaturationResult::Timeout(LimitReason::Iterations) => "GaveUp",
        SaturationResult::Error(_) => "Error",
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();
    env_logger::builder()
        .format(|buf, record| {
            let level_style = buf.default_level_style(record.level()).bold();
            writeln!(
                buf,
                "{}|{level_style}{:7}{level_style:#}|{:10}| {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    info!("parsing {}", args.file.display());
    let problem = tptp_parser::parse_file(&args.file);
    let refuting_conjecture =
        !problem.conjectures.is_empty() || !problem.negated_conjectures.is_empty();

    let mut term_bank = TermBank::new();
    let clausified = clausify(problem, &mut term_bank);
    let (clauses, set_of_support) = if args.set_of_support {
        (clausified.goal, clausified.axioms)
    } else {
        let mut clauses = clausified.axioms;
        clauses.extend(clausified.goal);
        (clauses, Vec::new())
    };

    let config = SaturationConfig {
        selection: args.selection,
        age_weight_ratio: args.age_weight_ratio,
        log_proof: args.proof_graph.is_some(),
    };
    let limits = ResourceLimitConfig {
        duration: args.time_limit.map(Duration::from_secs),
        memory_limit: args.memory_limit.map(|mib| mib * 1024 * 1024),
        max_iterations: args.max_iterations,
    };

    let mut saturation = Saturation::new(clauses, set_of_support, &mut term_bank, config);
    let result = saturation.run(&limits);
    info!(
        "search stopped after {} iterations, {} active and {} passive clauses",
        saturation.iterations(),
        saturation.state().active.len(),
        saturation.state().passive.len()
    );

    if let Some(mode) = args.proof_graph {
        let graph = saturation.proof_log().to_graphviz(mode);
        match &args.proof_file {
            Some(path) => {
                if let Err(err) = std::fs::write(path, graph) {
                    eprintln!("unable to write proof graph to {}: {err}", path.display());
                }
            }
            None => println!("{graph}"),
        }
    }

    if let SaturationResult::Error(err) = &result {
        eprintln!("internal error: {err}");
    }
    println!(
        "% SZS status {} for {}",
        szs_status(&result, refuting_conjecture),
        args.file.display()
    );
    match result {
        SaturationResult::Unsat(_) | SaturationResult::Sat => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
