use std::path::PathBuf;

use book_infos::batch::CancellationFlag;
use book_infos::config::Config;
use book_infos::lookup::{CatalogClient, Resolver};
use book_infos::pipeline;
use book_infos::{Result, logging};
use clap::Parser;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if cli.test {
        println!("Test");
        return;
    }
    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose)?;
    let config = cli.load_config()?;

    let cancel = CancellationFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the running lookups");
            on_interrupt.cancel();
        }
    });

    let client = CatalogClient::new(
        config.metadata_base_url.clone(),
        config.editions_base_url.clone(),
        &config.user_agent,
        config.request_timeout(),
    )?;
    let resolver = Resolver::new(client, config.batch_options(), cancel);

    if cli.check_external_reference {
        pipeline::check_book_list(&config, &resolver, &config.external_reference_file).await?;
    }

    let mut new_titles = None;
    if cli.fetch_reference_database {
        let reference = pipeline::fetch_reference_database(&config)?;
        let (observed, columns) = pipeline::load_observed(&config)?;
        let result = pipeline::compare_with_reference(&config, &reference, &observed, &columns)?;
        new_titles = Some(
            result
                .new
                .iter()
                .map(|book| (book.record.title.clone(), book.record.author.clone()))
                .collect::<Vec<_>>(),
        );
    }

    if cli.fetch_book_infos {
        let (queries, filename_out) = match new_titles {
            Some(queries) => (queries, "new_books_infos"),
            None => {
                let (observed, _) = pipeline::load_observed(&config)?;
                let queries = observed
                    .records
                    .into_iter()
                    .map(|record| (record.title, record.author))
                    .collect();
                (queries, "book_infos")
            }
        };
        pipeline::fetch_book_infos(&config, &resolver, &queries, Some(filename_out)).await?;
    }

    info!("all requested stages completed");
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "book-infos",
    author,
    version,
    about = "Reconcile book want-lists with the books already owned and fetch their details."
)]
struct Cli {
    /// Check the external reference list of books by ISBN.
    #[arg(long)]
    check_external_reference: bool,

    /// Load the reference database and compare the want-list with it.
    #[arg(long)]
    fetch_reference_database: bool,

    /// Fetch the information of the wanted books.
    #[arg(long)]
    fetch_book_infos: bool,

    /// Print a marker and exit, for smoke testing.
    #[arg(long)]
    test: bool,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the workbooks; overrides the configuration.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Want-list workbook name, without extension; overrides the configuration.
    #[arg(long)]
    observed: Option<String>,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(name) = &self.observed {
            config.observed_file = name.clone();
        }
        Ok(config)
    }
}
