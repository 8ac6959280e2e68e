use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use yaspp::exec::{self, ProcessOptions};
use yaspp::{config, output, site::Site};

/// Where to find the project and, optionally, the generator config layer.
#[derive(Args, Clone)]
struct ProjectArgs {
    /// Project root containing yaspp.config.json
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Generator root whose config is merged under the project's
    #[arg(long)]
    app: Option<PathBuf>,
}

impl ProjectArgs {
    fn load(&self) -> Result<Site, yaspp::site::SiteError> {
        match &self.app {
            Some(app) => Site::load_with_app(app, &self.project),
            None => Site::load(&self.project),
        }
    }
}

#[derive(Parser)]
#[command(name = "yaspp")]
#[command(version, about = "Configuration, navigation and build-command tooling for yaspp sites")]
#[command(long_about = "\
Configuration, navigation and build-command tooling for yaspp sites

Project structure:

  my-site/
  ├── yaspp.config.json     # content, nav, locale, style, assets
  ├── nav.json              # items, sections, groups
  ├── content/docs/en/      # default-locale content
  ├── locales/
  └── style/

Run 'yaspp gen-config' to print a starter yaspp.config.json.")]
struct Cli {
    /// Log library events at info level (otherwise RUST_LOG, default warn)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the config and navigation graph
    Check(ProjectArgs),
    /// Print the resolved navigation tree
    Nav {
        #[command(flatten)]
        project: ProjectArgs,
        /// Language for titles (defaults to the config's defaultLocale)
        #[arg(long)]
        locale: Option<String>,
        /// Print a single section
        #[arg(long, conflicts_with = "group")]
        section: Option<String>,
        /// Print a single group (defaults to every top-level group)
        #[arg(long)]
        group: Option<String>,
    },
    /// Run an external command the way build steps do
    Exec {
        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
        /// Suppress all console output
        #[arg(long, short)]
        quiet: bool,
        /// Execute directly instead of through the shell
        #[arg(long)]
        no_shell: bool,
        /// Working directory for the command
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Kill the command after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Program followed by its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Print a starter yaspp.config.json
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Check(project) => {
            let site = project.load()?;
            println!("==> Checking {}", site.nav_path().display());
            let report = site.check();
            output::print_check_report(&report);
            if !report.is_valid() {
                return Err(format!("{} navigation error(s)", report.integrity.len()).into());
            }
            println!("==> Navigation is valid");
        }
        Command::Nav {
            project,
            locale,
            section,
            group,
        } => {
            let site = project.load()?;
            let locale = locale.unwrap_or_else(|| site.config.locale.default_locale.clone());
            if let Some(id) = section {
                output::print_section(&site.nav.resolve_section(&id, &locale)?);
            } else {
                let groups = match group {
                    Some(id) => vec![id],
                    None => site
                        .nav
                        .top_level_groups()
                        .into_iter()
                        .map(String::from)
                        .collect(),
                };
                for id in groups {
                    println!("{id}");
                    output::print_nav_entries(&site.nav.resolve_group(&id, &locale)?);
                }
            }
        }
        Command::Exec {
            dry_run,
            quiet,
            no_shell,
            cwd,
            timeout,
            command,
        } => {
            let mut parts = command.into_iter();
            let exe = parts.next().ok_or("missing command")?;
            let mut options = ProcessOptions::new(exe)
                .args(parts)
                .on_data(true)
                .on_error(true)
                .on_progress(!quiet)
                .dryrun(dry_run)
                .quiet(quiet)
                .shell(!no_shell);
            if let Some(dir) = cwd {
                options = options.cwd(dir);
            }
            if let Some(secs) = timeout {
                options = options.timeout(Duration::from_secs(secs));
            }

            let result = exec::run(options);
            if !result.success() {
                std::process::exit(result.status);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_json());
        }
    }

    Ok(())
}
