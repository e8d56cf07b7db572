//! pswitch CLI: switch a package reference to its source project and back.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use pswitch_core::config::SwitchConfig;
use pswitch_core::dotnet::solution::find_solution;
use pswitch_core::graph::solution::Solution;
use pswitch_core::output::{build_report, to_json, write_output};
use pswitch_core::pipeline::{self, ProgressCallback, RestorePlan, SwitchPlan};
use pswitch_core::process::ProcessRunner;
use pswitch_core::{Result, SwitchError};

#[derive(Parser)]
#[command(
    name = "pswitch",
    about = "pswitch - Switch a package reference to its source project and back"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
struct GlobalArgs {
    /// dotnet executable used for solution queries and edits
    #[arg(long, global = true, env = "PSWITCH_DOTNET", default_value = "dotnet")]
    dotnet: String,

    /// Show debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace a package reference with a project from another solution
    Switch {
        /// Solution to modify (.sln file or folder containing one)
        solution: PathBuf,

        /// Solution containing the package's source project
        target_solution: PathBuf,

        /// Package to switch
        #[arg(short, long)]
        package: String,

        /// Target project: path as listed in the target solution, file name, or name
        #[arg(long)]
        project: String,

        /// Solution folder the external projects are added under
        #[arg(long, default_value = "ExternalProjects")]
        solution_folder: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Print the planned changes without applying them
        #[arg(long)]
        dry_run: bool,
    },
    /// Restore a switched package reference
    Restore {
        /// Solution to modify (.sln file or folder containing one)
        solution: PathBuf,

        /// Package to restore
        #[arg(short, long)]
        package: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Print the planned changes without applying them
        #[arg(long)]
        dry_run: bool,
    },
    /// List packages and project references of a solution
    List {
        /// Solution to inspect (.sln file or folder containing one)
        solution: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let mut config = SwitchConfig {
        dotnet_program: cli.global.dotnet.clone(),
        verbose: cli.global.verbose,
        quiet: cli.global.quiet,
        ..Default::default()
    };

    let result = match cli.command {
        Commands::Switch {
            solution,
            target_solution,
            package,
            project,
            solution_folder,
            yes,
            dry_run,
        } => {
            config.solution_folder = solution_folder;
            config.assume_yes = yes;
            run_switch(&config, &solution, &target_solution, &package, &project, dry_run)
        }
        Commands::Restore {
            solution,
            package,
            yes,
            dry_run,
        } => {
            config.assume_yes = yes;
            run_restore(&config, &solution, &package, dry_run)
        }
        Commands::List {
            solution,
            json,
            output,
        } => run_list(&config, &solution, json, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("\n{}: {e}", style("Error").red().bold());
        if e.is_not_found() {
            eprintln!(
                "{}",
                style("Run `pswitch list <solution>` to see its projects and packages.").dim()
            );
        }
        std::process::exit(1);
    }
}

fn parse_solution(config: &SwitchConfig, path: &Path) -> Result<Solution> {
    let solution_path = find_solution(path)?;
    log::debug!("{} resolved to {}", path.display(), solution_path.display());

    let pb = if config.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(spinner) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(spinner.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(format!("Parsing {}", solution_path.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = Solution::parse(&solution_path, &ProcessRunner, config);
    pb.finish_and_clear();
    result
}

fn progress(config: &SwitchConfig) -> Option<ProgressCallback> {
    if config.quiet {
        return None;
    }
    Some(Box::new(|_step: &str, message: &str| {
        println!("  {message}");
    }))
}

/// A prompt is only shown when every standard stream is a terminal.
fn needs_prompt(assume_yes: bool, stdin: bool, stdout: bool, stderr: bool) -> bool {
    !assume_yes && stdin && stdout && stderr
}

/// Ask before mutating anything. Unattended runs proceed.
fn confirm(config: &SwitchConfig) -> bool {
    let term = Term::stderr();
    if !needs_prompt(
        config.assume_yes,
        std::io::stdin().is_terminal(),
        Term::stdout().is_term(),
        term.is_term(),
    ) {
        log::debug!("skipping confirmation");
        return true;
    }
    if term.write_str("\nDo you want to continue? [y/N] ").is_err() {
        return false;
    }
    match term.read_line() {
        Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn run_switch(
    config: &SwitchConfig,
    solution: &Path,
    target_solution: &Path,
    package: &str,
    project: &str,
    dry_run: bool,
) -> Result<()> {
    let work = parse_solution(config, solution)?;
    let target_sln = parse_solution(config, target_solution)?;

    let target = target_sln
        .find_project(project)
        .ok_or_else(|| SwitchError::ProjectNotFound(PathBuf::from(project)))?;

    let plan = match pipeline::plan_switch(&work, package, &target_sln, target) {
        Ok(plan) => plan,
        Err(e @ SwitchError::PackageNotFound { .. }) => {
            print_available_packages(&work);
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    if !config.quiet {
        print_switch_summary(config, &work, &target_sln, &plan);
    }
    if dry_run {
        return Ok(());
    }
    if !confirm(config) {
        println!("\n{}", style("Cancelled").red());
        return Ok(());
    }

    if !config.quiet {
        println!("\n{}", style("Proceeding...").green());
    }
    pipeline::run_switch(&work, &target_sln, &plan, &ProcessRunner, config, progress(config))?;

    if !config.quiet {
        println!("\n{}", style("Done!").green());
    }
    Ok(())
}

fn run_restore(config: &SwitchConfig, solution: &Path, package: &str, dry_run: bool) -> Result<()> {
    let work = parse_solution(config, solution)?;
    let plan = pipeline::plan_restore(&work, package)?;

    if !config.quiet {
        print_restore_summary(&work, &plan);
    }
    if dry_run {
        return Ok(());
    }
    if !confirm(config) {
        println!("\n{}", style("Cancelled").red());
        return Ok(());
    }

    pipeline::run_restore(&work, &plan, &ProcessRunner, config, progress(config))?;

    if !config.quiet {
        println!("\n{}", style("Done!").green());
    }
    Ok(())
}

fn run_list(config: &SwitchConfig, solution: &Path, json: bool, output: Option<&str>) -> Result<()> {
    let work = parse_solution(config, solution)?;
    let report = build_report(&work);

    if let Some(output_path) = output {
        write_output(&report, output_path)?;
        if !config.quiet {
            println!("{} {}", style("Report written to:").green(), output_path);
        }
        return Ok(());
    }
    if json {
        println!("{}", to_json(&report)?);
        return Ok(());
    }

    println!(
        "\n{}  {}",
        style(&work.name).green().bold(),
        style(work.absolute_path.display()).dim()
    );

    println!("\n  Packages:");
    for package in work.packages() {
        let marker = if package.switched {
            style(" switched").yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "    {} {}{}",
            style(&package.name).magenta(),
            style(format!("({})", package.versions_text())).dim(),
            marker
        );
    }

    println!("\n  Projects:");
    let graph = work.graph();
    for &id in work.members() {
        let project = graph.project(id);
        println!("    {}", style(&project.name).blue());
        for (target, reference) in graph.references(id) {
            let target = graph.project(target);
            if reference.switch.is_switched {
                println!(
                    "      => {} {} {}",
                    style(&target.name).cyan(),
                    style(format!("(replaces {})", reference.switch.switch_reference)).yellow(),
                    style(target.absolute_path.display()).dim()
                );
            } else {
                println!("      -> {}", target.name);
            }
        }
    }
    Ok(())
}

fn print_available_packages(work: &Solution) {
    let packages = work.packages();
    if packages.is_empty() {
        return;
    }
    eprintln!("\nPackages in {}:", style(&work.name).green());
    for package in packages.iter().filter(|p| !p.switched) {
        eprintln!(
            "  {}   {}",
            style(&package.name).magenta(),
            style(format!("({})", package.versions_text())).dim()
        );
    }
}

fn print_switch_summary(config: &SwitchConfig, work: &Solution, target_sln: &Solution, plan: &SwitchPlan) {
    println!("\n\n{}", style("-".repeat(62)).dim());
    println!("Summary of changes to be performed:\n");
    println!(
        "Adding external projects to {}/{} solution folder:",
        style(&work.name).green(),
        style(&config.solution_folder).cyan()
    );
    for &id in &plan.external_projects {
        let project = target_sln.project(id);
        println!(
            "  {} {}",
            style(&project.name).cyan(),
            style(format!("({})", project.absolute_path.display())).dim()
        );
    }

    let target = target_sln.project(plan.target);
    println!("\nSwitching package to project reference in projects:");
    for &id in &plan.projects_to_switch {
        let project = work.project(id);
        let version = project
            .package(&plan.package_name)
            .map(|p| p.version.clone())
            .unwrap_or_default();
        println!(
            "  {}: {} {} => {} {}",
            style(&project.name).blue(),
            style(&plan.package_name).magenta(),
            style(format!("({version})")).dim(),
            style(&target.name).cyan(),
            style(format!("({})", target.absolute_path.display())).dim()
        );
    }
}

fn print_restore_summary(work: &Solution, plan: &RestorePlan) {
    println!("\n\n{}", style("-".repeat(62)).dim());
    println!("Summary of changes to be performed:\n");
    println!("Removing external projects from {}:", style(&work.name).green());
    for &id in &plan.external_projects {
        let project = work.project(id);
        println!(
            "  {} {}",
            style(&project.name).cyan(),
            style(format!("({})", project.absolute_path.display())).dim()
        );
    }
    println!("\nRestoring package reference in projects:");
    for &id in &plan.projects_to_restore {
        println!(
            "  {}: {}",
            style(&work.project(id).name).blue(),
            style(&plan.package_name).magenta()
        );
    }
}
