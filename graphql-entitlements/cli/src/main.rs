use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use graphql_entitlements::GrantedEntitlements;
use graphql_entitlements::configuration::Configuration;
use graphql_entitlements::configuration::generate_config_schema;
use graphql_entitlements::policy;
use tracing_subscriber::EnvFilter;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Log level (off|error|warn|info|debug|trace), or any `tracing` env filter.
    #[arg(long = "log", default_value = "warn", env = "GRAPHQL_ENTITLEMENTS_LOG")]
    log_level: String,

    /// Configuration file, for its parser limits and default depth. The `policy` command also
    /// reads its properties and variables from it.
    #[arg(short, long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the access paths of a request, one per line
    Paths {
        /// The path to the request file, or `-` for stdin
        request: PathBuf,
    },
    /// Print the paths of a request that the entitlements do not cover
    Authorize {
        /// The path to the request file, or `-` for stdin
        request: PathBuf,
        /// Granted entitlements, separated by whitespace, commas or semicolons
        #[arg(short, long = "entitlements")]
        entitlements: Vec<String>,
    },
    /// Derive the entitlements of every scope declared by a schema
    Derive {
        /// The path to the schema file, or `-` for stdin
        schema: PathBuf,
        /// Number of nodes, the root included, explored on each path
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Run the host policy against the properties and variables of a configuration file
    Policy {
        /// The path to the configuration file holding the policy properties, or `-` for stdin.
        /// Defaults to the `--config` file, and cannot be combined with it.
        policy_configuration: Option<PathBuf>,
    },
    /// Print the JSON schema of the configuration file
    ConfigSchema,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).context("could not parse log configuration")?,
        )
        .with_writer(io::stderr)
        .init();

    let configuration = || match &args.config {
        Some(path) => load_configuration(path),
        None => Ok(Configuration::default()),
    };

    match &args.command {
        Command::Paths { request } => paths(request, &configuration()?),
        Command::Authorize {
            request,
            entitlements,
        } => authorize(request, entitlements, &configuration()?),
        Command::Derive { schema, max_depth } => derive(schema, *max_depth, &configuration()?),
        Command::Policy {
            policy_configuration,
        } => run_policy(policy_source(
            args.config.as_deref(),
            policy_configuration.as_deref(),
        )?),
        Command::ConfigSchema => {
            let schema = generate_config_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_input(input_path: &Path) -> Result<String> {
    if input_path == Path::new("-") {
        io::read_to_string(io::stdin()).context("could not read stdin")
    } else {
        fs::read_to_string(input_path)
            .with_context(|| format!("could not read {}", input_path.display()))
    }
}

fn load_configuration(path: &Path) -> Result<Configuration> {
    let configuration = Configuration::from_str(&read_input(path)?)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    tracing::debug!(?configuration, "loaded configuration");
    Ok(configuration)
}

fn paths(request: &Path, configuration: &Configuration) -> Result<ExitCode> {
    let request = read_input(request)?;
    let document = graphql_entitlements::document::parse(
        request.as_str(),
        &configuration.parser_limits(),
    )?;
    for path in graphql_entitlements::paths::extract_paths(&document) {
        println!("{}", path);
    }
    Ok(ExitCode::SUCCESS)
}

fn authorize(
    request: &Path,
    entitlements: &[String],
    configuration: &Configuration,
) -> Result<ExitCode> {
    let request = read_input(request)?;
    let granted = GrantedEntitlements::parse(&entitlements.join(" "));
    let document = graphql_entitlements::document::parse(
        request.as_str(),
        &configuration.parser_limits(),
    )?;
    let unauthorized = graphql_entitlements::authorize(&*document, granted)?;

    println!("{}", serde_json::to_string_pretty(&unauthorized)?);
    if unauthorized.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn derive(
    schema: &Path,
    max_depth: Option<usize>,
    configuration: &Configuration,
) -> Result<ExitCode> {
    let schema = read_input(schema)?;
    let catalogue = graphql_entitlements::derive_entitlements_with_limits(
        schema.as_str(),
        max_depth.or(Some(configuration.limits.max_depth)),
        &configuration.parser_limits(),
    )?;
    println!("{}", serde_json::to_string_pretty(&catalogue)?);
    Ok(ExitCode::SUCCESS)
}

/// The policy command reads one configuration file, given either positionally or with `--config`.
fn policy_source<'a>(config: Option<&'a Path>, positional: Option<&'a Path>) -> Result<&'a Path> {
    match (config, positional) {
        (Some(_), Some(_)) => anyhow::bail!(
            "the policy configuration is given both with --config and as an argument, pass only one"
        ),
        (Some(path), None) | (None, Some(path)) => Ok(path),
        (None, None) => anyhow::bail!("missing the policy configuration file"),
    }
}

fn run_policy(path: &Path) -> Result<ExitCode> {
    let configuration = load_configuration(path)?;
    let context = configuration.context();
    let result = policy::authz(&context, &configuration.parser_limits());

    println!("{}", serde_json::to_string_pretty(&context.variables())?);
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(error) => {
            eprintln!("{}", error);
            Ok(ExitCode::FAILURE)
        }
    }
}
