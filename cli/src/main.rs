mod config;
mod error;
mod pipeline;
mod schedule;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use job_filter::{Keywords, Platform, Posting, PostingFilter, RecencyFilter, TechFilter};
use job_scraper::gupy::GupyCollector;
use job_scraper::infojobs::{Credentials, InfojobsCollector};
use job_scraper::linkedin::LinkedinCollector;
use job_scraper::{Collector, HttpSession};
use notifier::DiscordNotifier;
use persistence::SnapshotFile;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::schedule::Schedule;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file overriding the built-in search settings
    #[clap(long)]
    config: Option<PathBuf>,

    /// Where the postings of the last cycle are kept
    #[clap(long, env = "SNAPSHOT_PATH")]
    snapshot: Option<PathBuf>,

    /// List of job boards to search, all configured boards when omitted
    #[clap(long)]
    site: Vec<Platform>,

    #[clap(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    webhook_url: Option<String>,

    #[clap(long, env = "INFOJOBS_CLIENT_ID")]
    infojobs_client_id: Option<String>,

    #[clap(long, env = "INFOJOBS_CLIENT_SECRET", hide_env_values = true)]
    infojobs_client_secret: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// One cycle now, then one at every scheduled time
    Run {},
    /// A single cycle
    Once {},
    /// Shows how a posting would be classified
    Check {
        #[clap(long)]
        title: String,
        #[clap(long)]
        description: Option<String>,
        #[clap(long, default_value = "Recent")]
        date_posted: String,
        #[clap(long, default_value = "linkedin")]
        platform: Platform,
    },
}

fn settings(args: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(snapshot) = &args.snapshot {
        settings.snapshot_path = snapshot.clone();
    }
    if !args.site.is_empty() {
        settings.sites = args.site.clone();
    }
    if let Some(url) = &args.webhook_url {
        settings.webhook_url = url.clone();
    }
    if let (Some(client_id), Some(client_secret)) =
        (&args.infojobs_client_id, &args.infojobs_client_secret)
    {
        settings.infojobs = Some(Credentials {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        });
    }
    settings.validate()?;
    Ok(settings)
}

fn collectors(settings: &Settings) -> Result<Vec<Box<dyn Collector>>> {
    let mut collectors: Vec<Box<dyn Collector>> = Vec::new();
    for site in &settings.sites {
        let session = HttpSession::new(settings.http.clone())?;
        match site {
            Platform::Linkedin => collectors.push(Box::new(LinkedinCollector::new(session))),
            Platform::Gupy => collectors.push(Box::new(GupyCollector::new(session))),
            Platform::Infojobs => match &settings.infojobs {
                Some(credentials) => collectors.push(Box::new(InfojobsCollector::new(
                    session,
                    credentials.clone(),
                ))),
                None => log::warn!("InfoJobs enabled without client credentials, skipping"),
            },
        }
    }
    if collectors.is_empty() {
        return Err(Error::NoSites);
    }
    Ok(collectors)
}

fn pipeline(settings: &Settings) -> Result<Pipeline> {
    if settings.webhook_url.is_empty() {
        log::warn!("DISCORD_WEBHOOK_URL not set, notifications will fail");
    }
    let notifier = DiscordNotifier::new(settings.webhook_url.clone(), settings.location.clone())?
        .with_embed_pause(settings.embed_pause());
    Ok(Pipeline::new(
        settings,
        collectors(settings)?,
        SnapshotFile::new(settings.snapshot_path.clone()),
        Box::new(notifier),
    ))
}

fn check(settings: &Settings, posting: &Posting) {
    let level = settings.level_filter();
    let tech = TechFilter::new(Keywords::new(&settings.tech_keywords));
    println!("title:   {}", posting.title);
    println!("level:   {}", level.accepts(posting));
    println!("tech:    {}", tech.accepts(posting));
    println!("recent:  {}", RecencyFilter.accepts(posting));
}

async fn run(args: Cli) -> Result<()> {
    let settings = settings(&args)?;
    match args.command.unwrap_or(Commands::Run {}) {
        Commands::Run {} => {
            let schedule = Schedule::from_settings(&settings)?;
            let pipeline = pipeline(&settings)?;
            log::info!(
                "searching {} for {} on {}",
                settings.location,
                settings.job_levels.join(", "),
                settings
                    .sites
                    .iter()
                    .map(Platform::name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            tokio::select! {
                _ = schedule::run_scheduled(&pipeline, &schedule) => {}
                _ = tokio::signal::ctrl_c() => {
                    log::info!("interrupted while {:?}, stopping", pipeline.stage())
                }
            }
        }
        Commands::Once {} => {
            let report = pipeline(&settings)?.run_cycle().await?;
            println!("{}", report);
            for posting in &report.new {
                println!("[{}] {} - {} ({})", posting.platform, posting.title, posting.company, posting.url);
            }
        }
        Commands::Check {
            title,
            description,
            date_posted,
            platform,
        } => {
            let posting = Posting::new(title, "", "", date_posted, platform, "#", description);
            check(&settings, &posting);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();
    if let Err(e) = run(args).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_infojobs_without_credentials_is_skipped() {
        let settings = Settings {
            sites: vec![Platform::Linkedin, Platform::Infojobs],
            infojobs: None,
            ..Settings::default()
        };
        let platforms = collectors(&settings)
            .unwrap()
            .iter()
            .map(|collector| collector.platform())
            .collect::<Vec<_>>();
        assert_eq!(platforms, vec![Platform::Linkedin]);
    }

    #[test]
    fn test_no_usable_collector_is_an_error() {
        let settings = Settings {
            sites: vec![Platform::Infojobs],
            infojobs: None,
            ..Settings::default()
        };
        assert!(matches!(collectors(&settings), Err(Error::NoSites)));
    }

    #[test]
    fn test_infojobs_with_credentials_is_built() {
        let settings = Settings {
            sites: vec![Platform::Infojobs],
            infojobs: Some(Credentials {
                client_id: "id".to_owned(),
                client_secret: "secret".to_owned(),
            }),
            ..Settings::default()
        };
        let built = collectors(&settings).unwrap();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].platform(), Platform::Infojobs);
    }
}
