//! glmselect command-line interface

use clap::Parser;
use log::{info, LevelFilter};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use glmselect::cli::{Cli, Commands};
use glmselect::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["fit", "select", "step", "interval", "help"];
    let has_subcommand = first_positional.map_or(false, |a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        // No subcommand: handle top-level help/version manually
        if args.len() == 1 {
            print_no_args();
            return;
        }
        if args.iter().any(|a| a == "--help") {
            print_long_help();
            return;
        }
        if args.iter().any(|a| a == "-h") {
            print_short_help();
            return;
        }
        if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("glmselect {}", VERSION);
            return;
        }
        // Unknown flags without a subcommand fall back to the hint
        print_no_args();
        return;
    }

    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Fit {
            file,
            response,
            offset,
            distribution,
            link,
            method,
            tol,
            maxit,
            history,
            no_warm_start,
            no_intercept,
            output,
            format,
        }) => run_fit(
            &file,
            &response,
            offset.as_deref(),
            &distribution,
            link.as_deref(),
            &method,
            tol,
            maxit,
            history,
            no_warm_start,
            no_intercept,
            output.as_deref(),
            &format,
        ),
        Some(Commands::Select {
            file,
            response,
            offset,
            distribution,
            link,
            method,
            tol,
            maxit,
            history,
            no_warm_start,
            no_intercept,
            metric,
            num_best,
            cutoff,
            max_size,
            keep,
            progress,
            threads,
            output,
            format,
        }) => run_select(
            &file,
            &response,
            offset.as_deref(),
            &distribution,
            link.as_deref(),
            &method,
            tol,
            maxit,
            history,
            no_warm_start,
            no_intercept,
            &metric,
            num_best,
            cutoff,
            max_size,
            &keep,
            progress,
            threads,
            output.as_deref(),
            &format,
        ),
        Some(Commands::Step {
            file,
            response,
            offset,
            distribution,
            link,
            method,
            tol,
            maxit,
            history,
            no_warm_start,
            no_intercept,
            metric,
            direction,
            steps,
            keep,
            threads,
            output,
            format,
        }) => run_step(
            &file,
            &response,
            offset.as_deref(),
            &distribution,
            link.as_deref(),
            &method,
            tol,
            maxit,
            history,
            no_warm_start,
            no_intercept,
            &metric,
            &direction,
            steps,
            &keep,
            threads,
            output.as_deref(),
            &format,
        ),
        Some(Commands::Interval {
            file,
            response,
            offset,
            distribution,
            link,
            method,
            tol,
            maxit,
            history,
            no_warm_start,
            no_intercept,
            metric,
            level,
            expansions,
            term,
            threads,
            output,
            format,
        }) => run_interval(
            &file,
            &response,
            offset.as_deref(),
            &distribution,
            link.as_deref(),
            &method,
            tol,
            maxit,
            history,
            no_warm_start,
            no_intercept,
            &metric,
            level,
            expansions,
            &term,
            threads,
            output.as_deref(),
            &format,
        ),
        None => {
            // Should not reach here (handled above), but just in case
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Custom help output
// ---------------------------------------------------------------------------

fn print_no_args() {
    println!("glmselect v{}", VERSION);
    println!("Run `glmselect -h` for usage or `glmselect --help` for detailed information.");
}

fn print_short_help() {
    println!("glmselect v{}", VERSION);
    println!();
    println!("Usage: glmselect <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  fit       Fit a single GLM");
    println!("  select    Find the best variable subsets by branch and bound");
    println!("  step      Greedy stepwise selection");
    println!("  interval  Profile-metric confidence intervals");
    println!();
    println!("Run `glmselect <COMMAND> -h` for command-specific options.");
}

fn print_long_help() {
    println!("glmselect v{}", VERSION);
    println!("GLM fitting and best-subset model selection");
    println!();
    println!("Usage: glmselect <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  fit       Fit a single GLM");
    println!("              - gaussian, binomial, poisson, and gamma responses");
    println!("              - Fisher scoring, BFGS, or L-BFGS with a strong-Wolfe line search");
    println!("              - standard errors from the inverse Fisher information");
    println!("  select    Find the best variable subsets by branch and bound");
    println!("              - exact: equivalent to fitting every admissible subset");
    println!("              - AIC, AICc, or BIC, with a Best-K list and metric cutoff");
    println!("              - forced-in variables and a model size cap");
    println!("  step      Greedy forward, backward, or bidirectional selection");
    println!("  interval  Profile-metric confidence intervals for fitted coefficients");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h               Print short help");
    println!("      --help       Print detailed help");
    println!("  -V, --version    Print version");
    println!();
    println!("Examples:");
    println!("  glmselect fit -f data.tsv -r y --distribution poisson -o coefficients.tsv");
    println!();
    println!("  glmselect select -f data.tsv -r y --metric bic --num-best 10 --progress");
    println!();
    println!("  glmselect step -f trials.csv -r outcome --distribution binomial \\");
    println!("    --direction backward");
    println!();
    println!("  glmselect interval -f data.tsv -r y --level 0.99 -o intervals.tsv");
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

fn configure_threads(threads: usize) {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }
}

fn parse_family(distribution: &str, link: Option<&str>) -> Result<Family> {
    let distribution: Distribution = distribution.parse()?;
    let link: Link = match link {
        Some(name) => name.parse()?,
        None => distribution.canonical_link(),
    };
    Family::new(distribution, link)
}

fn build_control(
    method: &str,
    tol: f64,
    maxit: Option<usize>,
    history: usize,
    no_warm_start: bool,
) -> Result<FitControl> {
    let method: FitMethod = method.parse()?;
    let mut control = FitControl::for_method(method);
    control.tol = tol;
    if let Some(maxit) = maxit {
        control.maxit = maxit;
    }
    control.history = history;
    control.warm_start = !no_warm_start;
    Ok(control)
}

fn load_design(
    file: &str,
    response: &str,
    offset: Option<&str>,
    intercept: bool,
    keep: &[String],
) -> Result<DesignTable> {
    info!("Loading data from: {}", file);
    let table = read_table(file)?;
    info!("  {} rows, {} columns", table.n_rows(), table.names.len());
    build_design(&table, response, offset, intercept, keep)
}

fn write_or_print<T: serde::Serialize + std::fmt::Display>(
    output: Option<&str>,
    format: &str,
    report: &T,
    write_tsv: impl Fn(&str, &T) -> Result<()>,
) -> Result<()> {
    if let Some(path) = output {
        info!("Writing results to: {}", path);
        match format {
            "tsv" => write_tsv(path, report)?,
            "json" => write_json(path, report)?,
            other => {
                return Err(GlmSelectError::InvalidInput {
                    reason: format!("Unknown output format: {}. Use: tsv or json", other),
                })
            }
        }
    }
    println!("\n{}", report);
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn run_fit(
    file: &str,
    response: &str,
    offset: Option<&str>,
    distribution: &str,
    link: Option<&str>,
    method: &str,
    tol: f64,
    maxit: Option<usize>,
    history: usize,
    no_warm_start: bool,
    no_intercept: bool,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    let family = parse_family(distribution, link)?;
    let control = build_control(method, tol, maxit, history, no_warm_start)?;
    let design = load_design(file, response, offset, !no_intercept, &[])?;

    info!(
        "Fitting {} model with {} coefficients by {}...",
        family,
        design.data.n_cols(),
        control.method
    );
    let fitted = fit(&design.data, &family, None, &control)?;

    let report = FitReport::new(&fitted, &design.names, &family, control.method);
    write_or_print(output, format, &report, |p, r| write_fit(p, r))
}

fn run_select(
    file: &str,
    response: &str,
    offset: Option<&str>,
    distribution: &str,
    link: Option<&str>,
    method: &str,
    tol: f64,
    maxit: Option<usize>,
    history: usize,
    no_warm_start: bool,
    no_intercept: bool,
    metric: &str,
    num_best: usize,
    cutoff: f64,
    max_size: Option<usize>,
    keep: &[String],
    progress: bool,
    threads: usize,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    configure_threads(threads);

    let family = parse_family(distribution, link)?;
    let control = build_control(method, tol, maxit, history, no_warm_start)?;
    let metric: SelectionMetric = metric.parse()?;
    let design = load_design(file, response, offset, !no_intercept, keep)?;

    let options = SearchOptions {
        metric,
        num_best,
        cutoff,
        max_free: max_size,
        progress,
    };
    info!(
        "Searching {} candidate variables for the best {} model(s) by {}...",
        design.candidates.free_vars().len(),
        num_best,
        metric.name()
    );
    let result = select_best_subset(&design.data, &family, &design.candidates, &control, &options)?;

    let report = SearchReport::new(&result, metric, &design.names);
    write_or_print(output, format, &report, |p, r| write_selection(p, r))
}

fn run_step(
    file: &str,
    response: &str,
    offset: Option<&str>,
    distribution: &str,
    link: Option<&str>,
    method: &str,
    tol: f64,
    maxit: Option<usize>,
    history: usize,
    no_warm_start: bool,
    no_intercept: bool,
    metric: &str,
    direction: &str,
    steps: Option<usize>,
    keep: &[String],
    threads: usize,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    configure_threads(threads);

    let family = parse_family(distribution, link)?;
    let control = build_control(method, tol, maxit, history, no_warm_start)?;
    let metric: SelectionMetric = metric.parse()?;
    let direction: StepDirection = direction.parse()?;
    let design = load_design(file, response, offset, !no_intercept, keep)?;

    let options = StepwiseOptions {
        direction,
        metric,
        max_steps: steps.unwrap_or(usize::MAX),
    };
    info!("Running {} stepwise selection by {}...", direction, metric.name());
    let result = stepwise(&design.data, &family, &design.candidates, &control, &options)?;

    let report = StepwiseReport::new(&result, direction, metric, &design.names);
    write_or_print(output, format, &report, |p, r| write_stepwise(p, r))
}

fn run_interval(
    file: &str,
    response: &str,
    offset: Option<&str>,
    distribution: &str,
    link: Option<&str>,
    method: &str,
    tol: f64,
    maxit: Option<usize>,
    history: usize,
    no_warm_start: bool,
    no_intercept: bool,
    metric: &str,
    level: f64,
    expansions: u32,
    terms: &[String],
    threads: usize,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    configure_threads(threads);

    if !(level > 0.0 && level < 1.0) {
        return Err(GlmSelectError::InvalidInput {
            reason: format!("Confidence level must be in (0, 1), got {}", level),
        });
    }

    let family = parse_family(distribution, link)?;
    let control = build_control(method, tol, maxit, history, no_warm_start)?;
    let metric: SelectionMetric = metric.parse()?;
    let design = load_design(file, response, offset, !no_intercept, &[])?;

    info!("Fitting the full {} model...", family);
    let fitted = fit(&design.data, &family, None, &control)?;
    if !fitted.status.is_usable() {
        return Err(GlmSelectError::InvalidInput {
            reason: format!(
                "Full model fit failed (status {}), cannot profile it",
                fitted.status.code()
            ),
        });
    }

    let columns: Vec<usize> = if terms.is_empty() {
        (0..design.data.n_cols()).collect()
    } else {
        terms
            .iter()
            .map(|name| {
                design.names.iter().position(|n| n == name).ok_or_else(|| {
                    GlmSelectError::InvalidInput {
                        reason: format!("Unknown variable '{}' in term list", name),
                    }
                })
            })
            .collect::<Result<_>>()?
    };

    let base = metric.value(
        fitted.log_lik,
        design.data.n_cols(),
        design.data.n_obs(),
        family.has_dispersion(),
    );
    let quantile = ChiSquared::new(1.0).unwrap().inverse_cdf(level);
    let goal = base + quantile;
    info!(
        "Profiling {} coefficients to {} = {:.4} (fitted {:.4} + chi-square {:.4})...",
        columns.len(),
        metric.name(),
        goal,
        base,
        quantile
    );

    let interval_control = IntervalControl {
        fit: control,
        metric,
        expansions,
        ..IntervalControl::default()
    };
    let bounds = metric_interval(&design.data, &family, &fitted, &columns, goal, &interval_control)?;

    let report = IntervalReport::new(&bounds, metric, goal, &design.names);
    write_or_print(output, format, &report, |p, r| write_intervals(p, r))
}
