#[macro_use]
extern crate log;

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use chrono::Local;
use env_logger::fmt::Formatter;
use env_logger::Builder;
use failure::{Error, ResultExt};
use log::{LevelFilter, Record};
use project_crawler::{Config, ProjectCrawler, ProviderKind, Repository, RepositoryManagement};
use structopt::StructOpt;

fn main() {
    let args = Args::from_args();

    if args.example_config {
        if let Err(e) = generate_example() {
            report(&e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&args) {
        report(&e);
        process::exit(1);
    }
}

fn report(e: &Error) {
    eprintln!("Error: {}", e);

    for cause in e.iter_causes() {
        eprintln!("\tCaused By: {}", cause);
    }

    if env::var_os("RUST_BACKTRACE").is_some() {
        eprintln!("{}", e.backtrace());
    }
}

fn generate_example() -> Result<(), Error> {
    let example = Config::example();

    println!("{}", example.as_toml()?);
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    initialize_logging(args)?;
    let cfg = args.config()?;

    if log_enabled!(log::Level::Debug) {
        for line in format!("{:#?}", cfg).lines() {
            debug!("{}", line);
        }
    }

    let crawler = ProjectCrawler::new(cfg.options);
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    match args.cmd {
        Command::Repos { ref organization } => {
            let repos = crawler.repositories(organization)?;
            info!("Found {} repositories in {}", repos.len(), organization);
            print_repositories(&mut stdout, &repos, args.json)?;
        }
        Command::File {
            ref organization,
            ref repository,
            ref branch,
            ref path,
        } => {
            let content = crawler.file_content(organization, repository, branch, path)?;
            stdout.write_all(content.as_bytes())?;
        }
    }

    Ok(())
}

fn print_repositories<W: Write>(
    writer: &mut W,
    repos: &[Repository],
    json: bool,
) -> Result<(), Error> {
    if json {
        serde_json::to_writer_pretty(&mut *writer, repos)?;
        writeln!(writer)?;
    } else {
        for repo in repos {
            writeln!(
                writer,
                "{}\t{}\t{}",
                repo.name, repo.requested_branch, repo.clone_url
            )?;
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
#[structopt(about = "Find repositories and read files on GitHub or GitLab")]
struct Args {
    #[structopt(
        short = "c",
        long = "config",
        default_value = "~/.project-crawler.toml",
        help = "The configuration file to use."
    )]
    config_file: String,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Verbose output (repeat for more verbosity)"
    )]
    verbosity: u64,
    #[structopt(
        long = "example-config",
        help = "Generate an example config and immediately exit."
    )]
    example_config: bool,
    #[structopt(long = "root-url", help = "Override the configured root url.")]
    root_url: Option<String>,
    #[structopt(
        long = "provider",
        help = "Use a particular provider (github or gitlab) instead of guessing from the root url."
    )]
    provider: Option<ProviderKind>,
    #[structopt(long = "json", help = "Print repositories as JSON.")]
    json: bool,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
enum Command {
    /// List the repositories belonging to an organisation.
    #[structopt(name = "repos")]
    Repos { organization: String },
    /// Print a file from a repository.
    #[structopt(name = "file")]
    File {
        organization: String,
        repository: String,
        branch: String,
        path: String,
    },
}

impl Args {
    pub fn config(&self) -> Result<Config, Error> {
        let config_file =
            shellexpand::full(&self.config_file).context("Unable to expand wildcards")?;
        let config_file = Path::new(&*config_file);

        let mut cfg = if config_file.exists() {
            Config::from_file(config_file).context("Couldn't load the config")?
        } else {
            debug!("{} doesn't exist, using the defaults", config_file.display());
            Config::default()
        };

        if let Some(ref root_url) = self.root_url {
            cfg.options.root_url = root_url.clone();
        }
        if let Some(provider) = self.provider {
            cfg.options.repository = Some(provider);
        }

        Ok(cfg)
    }
}

fn initialize_logging(args: &Args) -> Result<(), Error> {
    let mut builder = Builder::new();
    builder
        .filter_module("project_crawler", level_for(args.verbosity))
        .format(format_record);

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    builder.try_init()?;
    Ok(())
}

fn level_for(verbosity: u64) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn format_record(out: &mut Formatter, record: &Record) -> io::Result<()> {
    let location = match record.line() {
        Some(line) => format!("{}:{}", record.module_path().unwrap_or(record.target()), line),
        None => record.target().to_string(),
    };

    writeln!(
        out,
        "{} {:<5} {} - {}",
        Local::now().format("%H:%M:%S%.3f"),
        record.level(),
        location,
        record.args()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_verbose_flag_raises_the_log_level() {
        let got: Vec<LevelFilter> = (0..5).map(level_for).collect();

        assert_eq!(
            got,
            vec![
                LevelFilter::Warn,
                LevelFilter::Info,
                LevelFilter::Debug,
                LevelFilter::Trace,
                LevelFilter::Trace,
            ]
        );
    }

    #[test]
    fn repositories_are_printed_one_per_line() {
        let repos = vec![
            Repository::new("app", "", "https://github.com/acme/app.git", "main"),
            Repository::new("lib", "", "https://github.com/acme/lib.git", "master"),
        ];
        let mut buffer = Vec::new();

        print_repositories(&mut buffer, &repos, false).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "app\tmain\thttps://github.com/acme/app.git\nlib\tmaster\thttps://github.com/acme/lib.git\n"
        );
    }
}
