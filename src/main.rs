use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

use mutor::Orchestrator;
use mutor::config::CommandSpec;
use mutor::driver::parse_command;
use mutor::error::MutorError;
use mutor::options::{self, LimitType, ReportFormat, RunOptions, Workflow};
use mutor::output::{self, ConsoleObserver};
use mutor::schemata::KNOWN_OPERATORS;

#[derive(Parser)]
#[command(name = "mutor", version, about = "Schemata-based mutation testing orchestration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LimitTypeArg {
    Count,
    Percent,
}

impl From<LimitTypeArg> for LimitType {
    fn from(value: LimitTypeArg) -> Self {
        match value {
            LimitTypeArg::Count => LimitType::Count,
            LimitTypeArg::Percent => LimitType::Percent,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Plain,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Plain => ReportFormat::Plain,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

#[derive(Args)]
struct CommonArgs {
    /// Project directory (default: current directory)
    #[arg(long)]
    project: Option<PathBuf>,
    /// Tool configuration file (default: mutor.conf.json in the project)
    #[arg(long)]
    configuration: Option<PathBuf>,
    /// Skip the new-version check
    #[arg(long)]
    skip_update_check: bool,
    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args)]
struct MutationArgs {
    /// Only mutate the given source files (repeatable or comma-separated)
    #[arg(long = "files-to-mutate")]
    files_to_mutate: Vec<String>,
    /// Only include the given test targets or test files
    #[arg(long = "unit-test-file")]
    unit_test_file: Vec<String>,
    /// Mutation operators to apply (default: all)
    #[arg(long = "operators")]
    operators: Vec<String>,
}

#[derive(Args)]
struct SamplingArgs {
    /// Cap on the number of mutants to test
    #[arg(long)]
    limit: Option<usize>,
    /// Interpret --limit as an absolute count or a percentage of all schemata
    #[arg(long, value_enum, default_value = "count")]
    limit_type: LimitTypeArg,
    /// Shuffle file and schema order before sampling
    #[arg(long)]
    randomize: bool,
}

#[derive(Args)]
struct ReportArgs {
    /// Report format
    #[arg(long, value_enum, default_value = "plain")]
    format: FormatArg,
    /// Write the report to a file instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full mutation testing run (or a test-plan-driven run with --test-plan)
    Run {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        mutation: MutationArgs,
        #[command(flatten)]
        sampling: SamplingArgs,
        #[command(flatten)]
        report: ReportArgs,
        /// Skip coverage discovery
        #[arg(long)]
        skip_coverage: bool,
        /// Run from a previously persisted test plan instead of discovering
        #[arg(long)]
        test_plan: Option<PathBuf>,
        /// Persist a test plan instead of running mutation tests
        #[arg(long)]
        create_test_plan: bool,
        /// Test command override, e.g. "cargo test"
        #[arg(long)]
        test_cmd: Option<String>,
    },
    /// Clean up and stage the mutated working copy only
    CreateWorkspace {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Discover mutation points, embed schemata, and persist a test plan
    DiscoverMutation {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        mutation: MutationArgs,
        /// Where to write the test plan
        #[arg(long)]
        test_plan: Option<PathBuf>,
    },
    /// Load a test plan and build the embedded working copy for testing
    ApplySchemata {
        #[command(flatten)]
        common: CommonArgs,
        /// Test plan to load
        #[arg(long)]
        test_plan: Option<PathBuf>,
        /// Only include the given test targets or test files
        #[arg(long = "unit-test-file")]
        unit_test_file: Vec<String>,
    },
    /// Load a test plan and run mutation tests against the built artifact
    ApplyMutation {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        sampling: SamplingArgs,
        #[command(flatten)]
        report: ReportArgs,
        /// Test plan to load
        #[arg(long)]
        test_plan: Option<PathBuf>,
        /// Only include the given test targets or test files
        #[arg(long = "unit-test-file")]
        unit_test_file: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    process::exit(dispatch(cli.command));
}

fn dispatch(command: Commands) -> i32 {
    match command {
        Commands::Run {
            common,
            mutation,
            sampling,
            report,
            skip_coverage,
            test_plan,
            create_test_plan,
            test_cmd,
        } => {
            let operators = options::split_list(&mutation.operators);
            if let Some(bad) = operators.iter().find(|o| !KNOWN_OPERATORS.contains(&o.as_str()))
            {
                output::print_error(&format!(
                    "Unknown operator '{}'. Known operators: {}",
                    bad,
                    KNOWN_OPERATORS.join(", ")
                ));
                return 2;
            }
            let run_options = RunOptions {
                files_to_mutate: options::split_list(&mutation.files_to_mutate),
                unit_test_files: options::split_list(&mutation.unit_test_file),
                operators,
                mutation_limit: sampling.limit,
                limit_type: sampling.limit_type.into(),
                randomize: sampling.randomize,
                skip_coverage,
                skip_update_check: common.skip_update_check,
                create_test_plan,
                test_plan_path: test_plan,
                configuration_path: common.configuration.clone(),
                workflow: None,
                report_format: report.format.into(),
                report_path: report.report,
                test_command_override: test_cmd.as_deref().map(command_spec),
            };
            execute(run_options, &common)
        }
        Commands::CreateWorkspace { common } => {
            let run_options = RunOptions {
                skip_update_check: common.skip_update_check,
                configuration_path: common.configuration.clone(),
                workflow: Some(Workflow::CreateWorkspace),
                ..RunOptions::default()
            };
            execute(run_options, &common)
        }
        Commands::DiscoverMutation { common, mutation, test_plan } => {
            let run_options = RunOptions {
                files_to_mutate: options::split_list(&mutation.files_to_mutate),
                unit_test_files: options::split_list(&mutation.unit_test_file),
                operators: options::split_list(&mutation.operators),
                skip_update_check: common.skip_update_check,
                test_plan_path: test_plan,
                configuration_path: common.configuration.clone(),
                workflow: Some(Workflow::DiscoverMutation),
                ..RunOptions::default()
            };
            execute(run_options, &common)
        }
        Commands::ApplySchemata { common, test_plan, unit_test_file } => {
            let run_options = RunOptions {
                unit_test_files: options::split_list(&unit_test_file),
                skip_update_check: common.skip_update_check,
                test_plan_path: test_plan,
                configuration_path: common.configuration.clone(),
                workflow: Some(Workflow::ApplySchemata),
                ..RunOptions::default()
            };
            execute(run_options, &common)
        }
        Commands::ApplyMutation {
            common,
            sampling,
            report,
            test_plan,
            unit_test_file,
        } => {
            let run_options = RunOptions {
                unit_test_files: options::split_list(&unit_test_file),
                mutation_limit: sampling.limit,
                limit_type: sampling.limit_type.into(),
                randomize: sampling.randomize,
                skip_update_check: common.skip_update_check,
                test_plan_path: test_plan,
                configuration_path: common.configuration.clone(),
                workflow: Some(Workflow::ApplyMutation),
                report_format: report.format.into(),
                report_path: report.report,
                ..RunOptions::default()
            };
            execute(run_options, &common)
        }
    }
}

fn command_spec(cmd: &str) -> CommandSpec {
    let (executable, arguments) = parse_command(cmd);
    CommandSpec { executable, arguments }
}

fn execute(run_options: RunOptions, common: &CommonArgs) -> i32 {
    let project = match &common.project {
        Some(p) => p.clone(),
        None => match std::env::current_dir() {
            Ok(p) => p,
            Err(e) => {
                output::print_error(&format!("Could not resolve current directory: {e}"));
                return 1;
            }
        },
    };

    let observer = ConsoleObserver::new(common.quiet);
    let mut orchestrator = Orchestrator::new(&observer);
    match orchestrator.run(run_options.clone(), project) {
        Ok(state) => {
            if let Some(outcome) = &state.outcome {
                if let Err(e) = output::report_outcome(outcome, &run_options) {
                    output::print_fatal(&e);
                    return e.exit_code();
                }
            }
            0
        }
        Err(MutorError::NoMutationPointsDiscovered) => {
            // Expected outcome, not a failure
            if !common.quiet {
                println!("no mutation points discovered");
            }
            0
        }
        Err(e) => {
            output::print_fatal(&e);
            e.exit_code()
        }
    }
}
