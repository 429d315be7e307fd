// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use anyhow::{Context, Result, anyhow};
use clap::{ArgMatches, Command, arg};
use std::{
    path::{Path, PathBuf},
    sync::atomic::Ordering,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use unimatch_ls::objective::Objective;
use unimatch_model::{
    assignment::Assignment, loading::InstanceLoader, model::Model, writing::AssignmentWriter,
};
use unimatch_solver::{
    config::{AcceptancePolicy, CoolingKind, SolverConfig},
    solver::{Solver, evaluate_assignment},
};

const DEFAULT_STUDENTS_FILE: &str = "students.csv";
const DEFAULT_UNIVERSITIES_FILE: &str = "universities.csv";
const DEFAULT_MERIT_FILE: &str = "merit_list.csv";

fn instance_args(cmd: Command) -> Command {
    cmd.arg(
        arg!(--students [PATH] "Students table (student_id, pref_1..pref_50)")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(--universities [PATH] "Universities table (university_id, cap)")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(--merit [PATH] "Merit list (student_id, merit_rank)")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(--"data-dir" [DIR] "Directory with students.csv, universities.csv, merit_list.csv")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(--alpha [ALPHA] "Weight of the student component, in [0, 1]")
            .value_parser(clap::value_parser!(f64)),
    )
}

fn cli() -> Command {
    Command::new("unimatch")
        .about("Improves a student/university assignment by swap-based local search")
        .version(clap::crate_version!())
        .arg_required_else_help(true)
        .arg(arg!(-v --verbose "Log every new best score").global(true))
        .subcommand(
            instance_args(
                Command::new("solve")
                    .about("Runs the search from a seed assignment and writes the result"),
            )
            .arg(
                arg!(--seed <PATH> "Seed assignment (student_id, university_id)")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                arg!(--output <PATH> "Where to write the improved assignment")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                arg!(--config [FILE] "JSON file with solver settings; flags override it")
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"time-limit" [SECS] "Wall-clock budget of the search in seconds")
                    .value_parser(clap::value_parser!(f64)),
            )
            .arg(
                arg!(--policy [POLICY] "Acceptance policy: greedy or annealing")
                    .value_parser(|s: &str| s.parse::<AcceptancePolicy>()),
            )
            .arg(
                arg!(--"initial-temperature" [TEMP] "Starting temperature of the annealing policy")
                    .value_parser(clap::value_parser!(f64)),
            )
            .arg(
                arg!(--cooling [SCHEDULE] "Cooling schedule: linear-time or geometric")
                    .value_parser(|s: &str| s.parse::<CoolingKind>()),
            )
            .arg(
                arg!(--"random-seed" [SEED] "Seed of the random streams")
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                arg!(--"iteration-limit" [N] "Stop after this many proposed swaps")
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                arg!(--"log-interval" [SECS] "Seconds between progress lines")
                    .value_parser(clap::value_parser!(f64)),
            ),
        )
        .subcommand(
            instance_args(
                Command::new("score").about("Recomputes FPE, FPU and Score of an assignment"),
            )
            .arg(
                arg!(--assignment <PATH> "Assignment to score (student_id, university_id)")
                    .value_parser(clap::value_parser!(PathBuf)),
            ),
        )
}

fn enable_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let matches = cli().get_matches();
    enable_tracing(matches.get_flag("verbose"));

    if let Err(e) = match matches.subcommand() {
        Some(("solve", sub_m)) => solve(sub_m),
        Some(("score", sub_m)) => score(sub_m),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Returns the explicit path, or `default` inside `--data-dir`.
fn table_path(matches: &ArgMatches, id: &str, default: &str) -> Result<PathBuf> {
    if let Some(path) = matches.get_one::<PathBuf>(id) {
        return Ok(path.clone());
    }
    matches
        .get_one::<PathBuf>("data-dir")
        .map(|dir| dir.join(default))
        .ok_or_else(|| anyhow!("missing --{} (or --data-dir)", id))
}

fn load_model(matches: &ArgMatches) -> Result<Model> {
    let students = table_path(matches, "students", DEFAULT_STUDENTS_FILE)?;
    let universities = table_path(matches, "universities", DEFAULT_UNIVERSITIES_FILE)?;
    let merit = table_path(matches, "merit", DEFAULT_MERIT_FILE)?;

    let model = InstanceLoader::new()
        .load_model_from_paths(&students, &universities, &merit)
        .context("Failed to load instance")?;
    info!(
        students = model.num_students(),
        universities = model.num_universities(),
        total_capacity = model.total_capacity(),
        "instance loaded"
    );
    Ok(model)
}

fn solver_config(matches: &ArgMatches) -> Result<SolverConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => SolverConfig::from_json_path(path)?,
        None => SolverConfig::default(),
    };

    if let Some(&alpha) = matches.get_one::<f64>("alpha") {
        config.alpha = alpha;
    }
    if let Some(&secs) = matches.get_one::<f64>("time-limit") {
        config.time_limit_secs = secs;
    }
    if let Some(&policy) = matches.get_one::<AcceptancePolicy>("policy") {
        config.acceptance_policy = policy;
    }
    if let Some(&temperature) = matches.get_one::<f64>("initial-temperature") {
        config.initial_temperature = temperature;
    }
    if let Some(&cooling) = matches.get_one::<CoolingKind>("cooling") {
        config.cooling = cooling;
    }
    if let Some(&seed) = matches.get_one::<u64>("random-seed") {
        config.random_seed = Some(seed);
    }
    if let Some(&limit) = matches.get_one::<u64>("iteration-limit") {
        config.iteration_limit = Some(limit);
    }
    if let Some(&secs) = matches.get_one::<f64>("log-interval") {
        config.log_interval_secs = secs;
    }
    Ok(config)
}

fn solve(matches: &ArgMatches) -> Result<()> {
    let config = solver_config(matches)?;
    let model = load_model(matches)?;

    let seed_path = matches
        .get_one::<PathBuf>("seed")
        .ok_or_else(|| anyhow!("missing --seed"))?;
    let output = matches
        .get_one::<PathBuf>("output")
        .ok_or_else(|| anyhow!("missing --output"))?;
    let seed = InstanceLoader::new()
        .load_assignment_from_path(&model, seed_path)
        .context("Failed to load seed assignment")?;

    let solver = Solver::new(config)?;
    install_interrupt_handler(&solver);

    let report = solver.solve(&model, seed)?;
    println!("{}", report);

    write_assignment(&model, report.assignment(), output)?;
    info!(path = %output.display(), "assignment written");
    Ok(())
}

/// The first Ctrl-C stops the search gracefully, the second one exits.
fn install_interrupt_handler(solver: &Solver) {
    let stop = solver.stop_signal();
    let result = ctrlc::set_handler(move || {
        if stop.swap(true, Ordering::Relaxed) {
            std::process::exit(130);
        }
        warn!("interrupt received; finishing with the best assignment so far");
    });
    if let Err(e) = result {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
}

fn write_assignment(model: &Model, assignment: &Assignment, path: &Path) -> Result<()> {
    AssignmentWriter::new(model)
        .write_to_path(assignment, path)
        .with_context(|| format!("Failed to write '{}'", path.display()))
}

fn score(matches: &ArgMatches) -> Result<()> {
    let alpha = matches.get_one::<f64>("alpha").copied().unwrap_or(0.5);
    if !(0.0..=1.0).contains(&alpha) {
        return Err(anyhow!("alpha must lie in [0, 1], got {}", alpha));
    }

    let model = load_model(matches)?;
    let path = matches
        .get_one::<PathBuf>("assignment")
        .ok_or_else(|| anyhow!("missing --assignment"))?;
    let assignment = InstanceLoader::new()
        .load_assignment_from_path(&model, path)
        .context("Failed to load assignment")?;

    let breakdown = evaluate_assignment(&model, &assignment, Objective::new(alpha))?;
    println!("Capacities: OK");
    println!("FPE:   {:.10}", breakdown.student);
    println!("FPU:   {:.10}", breakdown.university);
    println!("Score: {:.10}", breakdown.score);
    Ok(())
}
