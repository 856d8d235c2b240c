//! Command-line interface for glmselect

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "glmselect")]
#[command(version)]
#[command(about = "GLM fitting and best-subset model selection")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit a single GLM
    #[command(
        about = "Fit a single GLM",
        long_about = "Fit a single GLM\n\n\
            Estimates coefficients by Fisher scoring, BFGS, or L-BFGS with a\n\
            backtracking strong-Wolfe line search, and reports standard errors\n\
            from the inverse Fisher information at the optimum.",
        after_long_help = "\
Examples:
  # Gaussian fit with an intercept
  glmselect fit -f data.tsv -r y -o coefficients.tsv

  # Logistic regression by L-BFGS
  glmselect fit -f trials.csv -r outcome --distribution binomial --method lbfgs

  # Poisson rates with an exposure offset
  glmselect fit -f events.tsv -r count --distribution poisson --offset log_exposure"
    )]
    Fit {
        /// Path to the data file
        #[arg(short = 'f', long,
            long_help = "Path to the data file.\n\
                Format: rectangular numeric table with a header row of column names.\n\
                Supports both CSV (comma) and TSV (tab) delimiters (auto-detected).")]
        file: String,

        /// Response column name
        #[arg(short, long)]
        response: String,

        /// Offset column name
        #[arg(long, value_name = "COL",
            long_help = "Column added to the linear predictor with a fixed unit\n\
                coefficient, e.g. a log exposure for poisson rates.")]
        offset: Option<String>,

        /// Response distribution [default: gaussian]
        #[arg(long, default_value = "gaussian",
            long_help = "Response distribution.\n\
                gaussian: continuous response; identity, log, inverse, sqrt links\n\
                binomial: 0/1 response; logit, probit, cloglog links\n\
                poisson:  counts; log, identity, sqrt links\n\
                gamma:    positive continuous; log, identity, inverse, sqrt links")]
        distribution: String,

        /// Link function [default: canonical for the distribution]
        #[arg(long,
            long_help = "Link function.\n\
                Defaults to the distribution's canonical link: identity for\n\
                gaussian, logit for binomial, log for poisson and gamma.")]
        link: Option<String>,

        /// Fitting algorithm [default: fisher]
        #[arg(long, default_value = "fisher",
            long_help = "Fitting algorithm.\n\
                fisher: Fisher scoring (Newton steps on the expected information)\n\
                bfgs:   dense quasi-Newton\n\
                lbfgs:  limited-memory quasi-Newton (see --history)")]
        method: String,

        /// Convergence tolerance [default: 1e-6]
        #[arg(long, default_value = "1e-6")]
        tol: f64,

        /// Maximum iterations [default: 50 for fisher, 200 otherwise]
        #[arg(long)]
        maxit: Option<usize>,

        /// L-BFGS history length [default: 10]
        #[arg(long, default_value = "10")]
        history: usize,

        /// Skip the least-squares warm start
        #[arg(long,
            long_help = "Skip the least-squares warm start on the link-transformed\n\
                response and start from zero coefficients instead.")]
        no_warm_start: bool,

        /// Do not add an intercept column
        #[arg(long)]
        no_intercept: bool,

        /// Output file path; prints to stdout when absent
        #[arg(short, long)]
        output: Option<String>,

        /// Output format [default: tsv]
        #[arg(long, default_value = "tsv",
            long_help = "Output format for --output.\n\
                tsv:  tab-separated table\n\
                json: pretty-printed JSON report")]
        format: String,
    },

    /// Find the best variable subsets by branch and bound
    #[command(
        about = "Find the best variable subsets by branch and bound",
        long_about = "Find the best variable subsets by branch and bound\n\n\
            Searches every admissible subset of the candidate variables for the\n\
            models minimizing an information criterion, pruning subtrees whose\n\
            criterion lower bound cannot beat the models already kept. The\n\
            result is exact: identical to fitting every subset.",
        after_long_help = "\
Examples:
  # Best model by AIC, intercept always kept
  glmselect select -f data.tsv -r y

  # Ten best models by BIC over at most 5 predictors, with progress lines
  glmselect select -f data.tsv -r y --metric bic --num-best 10 --max-size 5 --progress

  # Logistic model search, forcing the exposure variable into every model
  glmselect select -f trials.csv -r outcome --distribution binomial --keep exposure"
    )]
    Select {
        /// Path to the data file
        #[arg(short = 'f', long)]
        file: String,

        /// Response column name
        #[arg(short, long)]
        response: String,

        /// Offset column name
        #[arg(long, value_name = "COL")]
        offset: Option<String>,

        /// Response distribution [default: gaussian]
        #[arg(long, default_value = "gaussian")]
        distribution: String,

        /// Link function [default: canonical for the distribution]
        #[arg(long)]
        link: Option<String>,

        /// Fitting algorithm [default: fisher]
        #[arg(long, default_value = "fisher")]
        method: String,

        /// Convergence tolerance [default: 1e-6]
        #[arg(long, default_value = "1e-6")]
        tol: f64,

        /// Maximum iterations per fit [default: 50 for fisher, 200 otherwise]
        #[arg(long)]
        maxit: Option<usize>,

        /// L-BFGS history length [default: 10]
        #[arg(long, default_value = "10")]
        history: usize,

        /// Skip the least-squares warm start
        #[arg(long)]
        no_warm_start: bool,

        /// Do not add an intercept column
        #[arg(long)]
        no_intercept: bool,

        /// Selection criterion [default: aic]
        #[arg(long, default_value = "aic",
            long_help = "Selection criterion to minimize.\n\
                aic:  Akaike information criterion\n\
                aicc: AIC with small-sample correction\n\
                bic:  Bayesian information criterion")]
        metric: String,

        /// How many models to keep [default: 1]
        #[arg(long, default_value = "1")]
        num_best: usize,

        /// Keep only models within this distance of the best metric [default: inf]
        #[arg(long, default_value = "inf",
            long_help = "Keep only models whose criterion lands within this distance\n\
                of the best one found. Also tightens pruning, so a finite cutoff\n\
                can speed the search up.")]
        cutoff: f64,

        /// Largest number of optional variables per model
        #[arg(long, value_name = "N",
            long_help = "Largest number of optional variables in any candidate model,\n\
                not counting the mandatory set. Unlimited when absent.")]
        max_size: Option<usize>,

        /// Variable forced into every model
        #[arg(long, value_name = "VAR",
            long_help = "Variable forced into every candidate model.\n\
                Can be specified multiple times: --keep exposure --keep age")]
        keep: Vec<String>,

        /// Print search progress
        #[arg(long)]
        progress: bool,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Output file path; prints to stdout when absent
        #[arg(short, long)]
        output: Option<String>,

        /// Output format [default: tsv]
        #[arg(long, default_value = "tsv")]
        format: String,
    },

    /// Greedy stepwise selection
    #[command(
        about = "Greedy stepwise selection",
        long_about = "Greedy stepwise selection\n\n\
            Walks the model space one variable at a time: each round fits all\n\
            single-variable moves in parallel and takes the best one while it\n\
            strictly improves the criterion. Faster than the exhaustive search\n\
            but not guaranteed to find the overall best model.",
        after_long_help = "\
Examples:
  # Forward selection by AICc
  glmselect step -f data.tsv -r y --metric aicc

  # Backward elimination from the full model
  glmselect step -f data.tsv -r y --direction backward

  # Bidirectional walk, at most 10 moves
  glmselect step -f data.tsv -r y --direction switch --steps 10"
    )]
    Step {
        /// Path to the data file
        #[arg(short = 'f', long)]
        file: String,

        /// Response column name
        #[arg(short, long)]
        response: String,

        /// Offset column name
        #[arg(long, value_name = "COL")]
        offset: Option<String>,

        /// Response distribution [default: gaussian]
        #[arg(long, default_value = "gaussian")]
        distribution: String,

        /// Link function [default: canonical for the distribution]
        #[arg(long)]
        link: Option<String>,

        /// Fitting algorithm [default: fisher]
        #[arg(long, default_value = "fisher")]
        method: String,

        /// Convergence tolerance [default: 1e-6]
        #[arg(long, default_value = "1e-6")]
        tol: f64,

        /// Maximum iterations per fit [default: 50 for fisher, 200 otherwise]
        #[arg(long)]
        maxit: Option<usize>,

        /// L-BFGS history length [default: 10]
        #[arg(long, default_value = "10")]
        history: usize,

        /// Skip the least-squares warm start
        #[arg(long)]
        no_warm_start: bool,

        /// Do not add an intercept column
        #[arg(long)]
        no_intercept: bool,

        /// Selection criterion [default: aic]
        #[arg(long, default_value = "aic")]
        metric: String,

        /// Walk direction [default: forward]
        #[arg(long, default_value = "forward",
            long_help = "Walk direction.\n\
                forward:  start from the mandatory set, only add variables\n\
                backward: start from the full model, only remove variables\n\
                switch:   start from the mandatory set, add or remove per round")]
        direction: String,

        /// Cap on accepted moves [default: unlimited]
        #[arg(long, value_name = "N")]
        steps: Option<usize>,

        /// Variable forced into every model
        #[arg(long, value_name = "VAR")]
        keep: Vec<String>,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Output file path; prints to stdout when absent
        #[arg(short, long)]
        output: Option<String>,

        /// Output format [default: tsv]
        #[arg(long, default_value = "tsv")]
        format: String,
    },

    /// Profile-metric confidence intervals for fitted coefficients
    #[command(
        about = "Profile-metric confidence intervals for fitted coefficients",
        long_about = "Profile-metric confidence intervals for fitted coefficients\n\n\
            Fits the full model, then for each coefficient finds the two values\n\
            at which the profiled information criterion rises a chi-square\n\
            quantile above the fitted one. A side is reported as NaN when the\n\
            profile never reaches the goal within the bracketing budget.",
        after_long_help = "\
Examples:
  # 95% intervals for every coefficient
  glmselect interval -f data.tsv -r y

  # 99% intervals for selected terms of a logistic model
  glmselect interval -f trials.csv -r outcome --distribution binomial \\
    --level 0.99 --term dose --term age"
    )]
    Interval {
        /// Path to the data file
        #[arg(short = 'f', long)]
        file: String,

        /// Response column name
        #[arg(short, long)]
        response: String,

        /// Offset column name
        #[arg(long, value_name = "COL")]
        offset: Option<String>,

        /// Response distribution [default: gaussian]
        #[arg(long, default_value = "gaussian")]
        distribution: String,

        /// Link function [default: canonical for the distribution]
        #[arg(long)]
        link: Option<String>,

        /// Fitting algorithm [default: fisher]
        #[arg(long, default_value = "fisher")]
        method: String,

        /// Convergence tolerance [default: 1e-6]
        #[arg(long, default_value = "1e-6")]
        tol: f64,

        /// Maximum iterations per fit [default: 50 for fisher, 200 otherwise]
        #[arg(long)]
        maxit: Option<usize>,

        /// L-BFGS history length [default: 10]
        #[arg(long, default_value = "10")]
        history: usize,

        /// Skip the least-squares warm start
        #[arg(long)]
        no_warm_start: bool,

        /// Do not add an intercept column
        #[arg(long)]
        no_intercept: bool,

        /// Criterion profiled for the interval [default: aic]
        #[arg(long, default_value = "aic")]
        metric: String,

        /// Confidence level [default: 0.95]
        #[arg(long, default_value = "0.95",
            long_help = "Confidence level. The interval goal is the fitted criterion\n\
                plus the chi-square(1) quantile at this level.")]
        level: f64,

        /// Bracket expansion budget [default: 10]
        #[arg(long, default_value = "10",
            long_help = "How many doubling steps, in standard-error units, to take\n\
                away from the estimate while hunting for a bracket before\n\
                reporting the side as NaN.")]
        expansions: u32,

        /// Profile only this variable
        #[arg(long, value_name = "VAR",
            long_help = "Profile only this variable.\n\
                Can be specified multiple times: --term dose --term age.\n\
                Every fitted coefficient is profiled when absent.")]
        term: Vec<String>,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Output file path; prints to stdout when absent
        #[arg(short, long)]
        output: Option<String>,

        /// Output format [default: tsv]
        #[arg(long, default_value = "tsv")]
        format: String,
    },
}
