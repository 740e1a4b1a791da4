//! `argtree` command-line front end
//!
//! Resolves task definitions into argument vectors and checks them. Never
//! spawns the tool itself.

use anyhow::{bail, Context, Result};
use argtree_config::{load_task, load_tools, CommandTask, ToolsConfig};
use argtree_core::{MemoryJob, PathRole};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let task = Arg::new("task")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Task definition file (.yaml, .yml, .json, .toml)");

    Command::new("argtree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compose tool command lines from task definitions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Raise log verbosity (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve the argument vector for one job")
                .arg(task.clone())
                .arg(
                    Arg::new("param")
                        .short('p')
                        .long("param")
                        .action(ArgAction::Append)
                        .value_name("NAME=VALUE")
                        .help("Job parameter"),
                )
                .arg(
                    Arg::new("path")
                        .short('i')
                        .long("path")
                        .action(ArgAction::Append)
                        .value_name("ROLE[:KEY]=PATH")
                        .help("Job file path (roles: input, output, module)"),
                )
                .arg(
                    Arg::new("job-id")
                        .long("job-id")
                        .default_value("cli")
                        .help("Job identifier used in logs"),
                )
                .arg(
                    Arg::new("module-root")
                        .long("module-root")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory module-role paths are resolved against"),
                )
                .arg(
                    Arg::new("tools")
                        .long("tools")
                        .value_parser(value_parser!(PathBuf))
                        .help("Tools configuration file"),
                )
                .arg(
                    Arg::new("tools-dir")
                        .long("tools-dir")
                        .env("ARGTREE_TOOLS_DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Base directory for installed tools"),
                )
                .arg(
                    Arg::new("search-path")
                        .long("search-path")
                        .action(ArgAction::SetTrue)
                        .help("Also search PATH for unqualified tools"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print a JSON array instead of one token per line"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Load a task definition and report on its tree")
                .arg(task),
        )
}

fn init_tracing(verbosity: u8, json: bool) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Split `NAME=VALUE`
fn parse_param(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => bail!("expected NAME=VALUE, got '{raw}'"),
    }
}

/// Split `ROLE[:KEY]=PATH`
fn parse_path(raw: &str) -> Result<(PathRole, Option<&str>, &str)> {
    let Some((target, path)) = raw.split_once('=') else {
        bail!("expected ROLE[:KEY]=PATH, got '{raw}'");
    };
    let (role, key) = match target.split_once(':') {
        Some((role, key)) => (role, Some(key)),
        None => (target, None),
    };
    let role = role.parse::<PathRole>().map_err(anyhow::Error::msg)?;
    Ok((role, key, path))
}

fn build_job(args: &ArgMatches) -> Result<MemoryJob> {
    let id = args
        .get_one::<String>("job-id")
        .map_or("cli", String::as_str);
    let mut job = MemoryJob::new(id);
    if let Some(root) = args.get_one::<PathBuf>("module-root") {
        job = job.with_module_root(root);
    }
    for raw in args.get_many::<String>("param").into_iter().flatten() {
        let (name, value) = parse_param(raw)?;
        job.set_param(name, value);
    }
    for raw in args.get_many::<String>("path").into_iter().flatten() {
        let (role, key, path) = parse_path(raw)?;
        job.add_path(role, key, path);
    }
    Ok(job)
}

fn tools_config(args: &ArgMatches) -> Result<ToolsConfig> {
    let config = match args.get_one::<PathBuf>("tools") {
        Some(path) => load_tools(path)
            .with_context(|| format!("failed to load tools configuration {}", path.display()))?,
        None => ToolsConfig::default(),
    };
    let mut config = config.with_tools_dir(args.get_one::<PathBuf>("tools-dir").cloned());
    if args.get_flag("search-path") {
        config.search_path = true;
    }
    Ok(config)
}

fn load(args: &ArgMatches) -> Result<CommandTask> {
    let path = args
        .get_one::<PathBuf>("task")
        .context("missing task definition")?;
    load_task(path).with_context(|| format!("failed to load task {}", path.display()))
}

/// Returns whether the job was valid and resolved
fn resolve(args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let task = load(args)?;
    let job = build_job(args)?;

    let errors = task.validate_job(&job);
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("error: {err}");
        }
        return Ok(false);
    }

    let locator = tools_config(args)?.locator();
    let tokens = task
        .to_args(&job, &locator)
        .with_context(|| format!("failed to resolve task '{}'", task.name()))?;
    tracing::debug!(task = task.name(), count = tokens.len(), "resolved command line");

    if args.get_flag("json") {
        writeln!(out, "{}", serde_json::to_string(&tokens)?)?;
    } else {
        for token in &tokens {
            writeln!(out, "{token}")?;
        }
    }
    Ok(true)
}

/// Returns whether the tree is free of cycles
fn check(args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let task = load(args)?;
    let tree = task.tree();

    writeln!(out, "task: {}", task.name())?;
    if let Some(description) = task.description() {
        writeln!(out, "description: {description}")?;
    }
    writeln!(out, "nodes: {}", tree.len())?;

    if !task.parameters().is_empty() {
        writeln!(out, "parameters:")?;
        for param in task.parameters() {
            write!(out, "  {} ({:?})", param.name, param.kind)?;
            if let Some(default) = &param.default {
                write!(out, " default={default}")?;
            }
            if let Some(help) = &param.help {
                write!(out, " - {help}")?;
            }
            writeln!(out)?;
        }
    }

    for warning in tree.warnings() {
        writeln!(out, "warning: {warning}")?;
    }

    match tree.find_cycle() {
        Some(node) => {
            let label = tree.label(node).unwrap_or("unnamed");
            writeln!(out, "cycle: node {node} ({label}) can reach itself")?;
            Ok(false)
        }
        None => {
            writeln!(out, "ok")?;
            Ok(true)
        }
    }
}

fn run(matches: &ArgMatches) -> Result<bool> {
    let mut stdout = io::stdout().lock();
    match matches.subcommand() {
        Some(("resolve", args)) => resolve(args, &mut stdout),
        Some(("check", args)) => check(args, &mut stdout),
        _ => bail!("unknown subcommand"),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"), matches.get_flag("log-json"));

    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TASK: &str = r"
name: demo
parameters:
  - { name: level, type: int, default: 3 }
converters:
  loop:
    type: list
    items: [x, { ref: loop }]
command:
  type: list
  items:
    - demo
    - { type: value-with-switch, param: level, switch: l }
    - { type: path, role: input }
";

    fn matches(args: &[&str]) -> ArgMatches {
        cli().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn parse_param_and_path() {
        assert_eq!(parse_param("a=b=c").unwrap(), ("a", "b=c"));
        assert_eq!(parse_param("a=").unwrap(), ("a", ""));
        assert!(parse_param("=x").is_err());
        assert!(parse_param("novalue").is_err());

        assert_eq!(
            parse_path("input=a.txt").unwrap(),
            (PathRole::Input, None, "a.txt")
        );
        assert_eq!(
            parse_path("output:report=out/r.tsv").unwrap(),
            (PathRole::Output, Some("report"), "out/r.tsv")
        );
        assert!(parse_path("scratch=x").is_err());
    }

    #[test]
    fn resolve_prints_tokens() {
        let tmp = tempfile::tempdir().unwrap();
        let task = tmp.path().join("demo.yaml");
        fs::write(&task, TASK).unwrap();
        let task = task.to_str().unwrap();

        let m = matches(&["argtree", "resolve", task, "-p", "level=5", "-i", "input=a.txt", "--json"]);
        let Some(("resolve", args)) = m.subcommand() else {
            panic!("expected resolve");
        };
        let mut out = Vec::new();
        assert!(resolve(args, &mut out).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "[\"demo\",\"-l\",\"5\",\"a.txt\"]\n");
    }

    #[test]
    fn resolve_rejects_invalid_parameters() {
        let tmp = tempfile::tempdir().unwrap();
        let task = tmp.path().join("demo.yaml");
        fs::write(&task, TASK).unwrap();

        let m = matches(&["argtree", "resolve", task.to_str().unwrap(), "-p", "level=high"]);
        let Some(("resolve", args)) = m.subcommand() else {
            panic!("expected resolve");
        };
        let mut out = Vec::new();
        assert!(!resolve(args, &mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn check_reports_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let task = tmp.path().join("demo.yaml");
        fs::write(&task, TASK).unwrap();

        let m = matches(&["argtree", "check", task.to_str().unwrap()]);
        let Some(("check", args)) = m.subcommand() else {
            panic!("expected check");
        };
        let mut out = Vec::new();
        assert!(!check(args, &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("task: demo"));
        assert!(text.contains("level (Int) default=3"));
        assert!(text.contains("(loop) can reach itself"));
    }
}
