mod common;
mod logic;
mod remote;
mod scenario;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use offcharts_game::Variant;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use common::{resolve_date_inputs, split_csv};
use logic::{Backend, RunPlan, ScenarioResult, ScenarioTester};
use remote::HttpScoreService;
use scenario::{get_scenario, list_scenarios};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TestMode {
    /// In-process games against a seeded scripted judge (fast, offline)
    Logic,
    /// Games scored by a running offcharts-server
    Http,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantArg {
    Pair,
    Grid,
    Both,
}

impl VariantArg {
    fn variants(self) -> Vec<Variant> {
        match self {
            Self::Pair => vec![Variant::Pair],
            Self::Grid => vec![Variant::Grid],
            Self::Both => vec![Variant::Pair, Variant::Grid],
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "offcharts-tester", version = "0.1.0")]
#[command(about = "Automated QA for Off the Charts - scripted games in-process or against a live server")]
struct Args {
    /// Test mode: logic (scripted judge) or http (live server)
    #[arg(long, value_enum, default_value_t = TestMode::Logic)]
    mode: TestMode,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Puzzle dates: today, presets, YYYY-MM-DD, start..end, or debug-<label> (comma-separated)
    #[arg(long, default_value = "today")]
    dates: String,

    /// Variants to play
    #[arg(long, value_enum, default_value_t = VariantArg::Both)]
    variant: VariantArg,

    /// Base seed; iteration N uses seed + N
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Number of iterations per scenario, date and variant
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Server base URL (http mode only)
    #[arg(long, env = "OFFCHARTS_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    server_url: String,

    /// Per-request timeout in seconds (http mode only)
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Keep save files from the resume scenario under this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let plan = RunPlan {
        date_keys: resolve_date_inputs(&split_csv(&args.dates))?,
        variants: args.variant.variants(),
        seed: args.seed,
        iterations: args.iterations,
        save_dir: args.save_dir.clone(),
    };
    let tester = ScenarioTester::new(build_backend(&args)?, args.verbose);

    let results = run_scenarios(&tester, &scenarios, &plan).await;
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        let http = get_scenario(key).is_some_and(|s| s.supports_http());
        let marker = if http { " [http]" } else { "" };
        writeln!(output_target.writer(), "  {key:15} - {description}{marker}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "📈 Off the Charts Automated Tester".bright_cyan().bold());
    println!("{}", "==================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn build_backend(args: &Args) -> Result<Backend> {
    match args.mode {
        TestMode::Logic => Ok(Backend::Scripted),
        TestMode::Http => {
            let service =
                HttpScoreService::new(&args.server_url, Duration::from_secs(args.timeout_secs))
                    .context("failed to build HTTP client")?;
            Ok(Backend::Http(service))
        }
    }
}

async fn run_scenarios(
    tester: &ScenarioTester,
    scenarios: &[String],
    plan: &RunPlan,
) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    let http = matches!(tester.backend(), Backend::Http(_));
    println!(
        "{}",
        format!("🧠 Running {} scenarios", tester.backend().label())
            .bright_yellow()
            .bold()
    );
    println!("{}", "-".repeat(30).yellow());

    for scenario_name in scenarios {
        let Some(scenario) = get_scenario(scenario_name) else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
            continue;
        };
        if http && !scenario.supports_http() {
            eprintln!(
                "⚠️  Scenario {} needs a scripted judge; skipping in http mode",
                scenario_name.yellow()
            );
            continue;
        }
        results.extend(tester.run_scenario(scenario.as_ref(), plan).await);
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Off the Charts Scenario Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
