use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use apalis::{
    layers::{retry::RetryPolicy, sentry::SentryLayer},
    prelude::*,
};
use apalis_cron::{CronStream, Tick};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use cron::Schedule;
use hacker_pulse::{
    aggregator::EpisodePaths,
    audio::{AssemblyReport, AudioAssembler},
    config::{parse_timezone, Credentials, PodcastConfig, SummaryConfig},
    cost::CostTracker,
    openai::OpenAIClient,
    sources::HttpContentFetcher,
    tracing::init_tracing_subscriber,
    Episode, EpisodeAggregatorBuilder, PodcastGenerator,
};
use story_datastore::JsonlStoryStore;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "hacker-pulse",
    version,
    about = "Summarizes the day's top tech stories and narrates them as a podcast"
)]
struct Cli {
    #[command(flatten)]
    credentials: Credentials,

    /// Time zone used for episode dates and the weekday voice
    #[arg(
        long,
        env = "HACKER_PULSE_TZ",
        default_value = "America/Los_Angeles",
        value_parser = parse_timezone,
        global = true
    )]
    timezone: Tz,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and summarize stories into an episode transcript
    Summarize {
        #[command(flatten)]
        summary: SummaryConfig,
    },
    /// Narrate an existing transcript into an MP3
    Podcast {
        /// Transcript to narrate
        input: PathBuf,

        /// Destination MP3, defaults to the input path with an .mp3 extension
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[command(flatten)]
        podcast: PodcastConfig,
    },
    /// Summarize, then narrate the resulting transcript
    Run {
        #[command(flatten)]
        summary: SummaryConfig,

        #[command(flatten)]
        podcast: PodcastConfig,
    },
    /// Run the full pipeline on a schedule
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 6 * * *")]
        schedule: String,

        #[command(flatten)]
        summary: SummaryConfig,

        #[command(flatten)]
        podcast: PodcastConfig,
    },
}

#[derive(Clone)]
struct Config {
    credentials: Credentials,
    timezone: Tz,
    summary: SummaryConfig,
    podcast: PodcastConfig,
    cancel: CancellationToken,
}

async fn summarize(config: &Config) -> anyhow::Result<Episode> {
    config.summary.validate()?;

    let openai = OpenAIClient::new(config.credentials.openai()?);
    let client = reqwest::Client::new();
    let source = config.summary.build_source(&config.credentials, client.clone());

    let date = chrono::Utc::now()
        .with_timezone(&config.timezone)
        .date_naive();
    let prefix = config.summary.file_prefix();
    let paths = EpisodePaths::new(&config.summary.outdir, prefix, date);

    let aggregator = EpisodeAggregatorBuilder::new(&config.summary.outdir)
        .store(JsonlStoryStore::new(&paths.summaries))
        .summarizer(openai)
        .source(source)
        .fetcher(HttpContentFetcher(client))
        .max_stories(config.summary.max_stories)
        .failure_policy(config.summary.failure_policy)
        .timezone(config.timezone)
        .date(date)
        .podcast_name(&config.summary.podcast_name)
        .narrator(&config.summary.narrator)
        .file_prefix(prefix)
        .build();

    let episode = tokio::select! {
        episode = aggregator.run() => episode?,
        _ = config.cancel.cancelled() => anyhow::bail!("[summarize] cancelled"),
    };

    tracing::info!(
        title = %episode.title,
        stories = episode.summaries.len(),
        cost = episode.cost(),
        transcript = %episode.paths.transcript.display(),
        "Episode summarized"
    );

    Ok(episode)
}

async fn podcast(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    costs: &mut CostTracker,
) -> anyhow::Result<AssemblyReport> {
    config.podcast.validate()?;

    let synthesizer = config.podcast.build_synthesizer(&config.credentials)?;
    let policy = config.podcast.build_voice_policy(&config.timezone)?;

    let mut assembler = AudioAssembler::new(synthesizer, config.podcast.build_merger())
        .with_cancellation(config.cancel.clone());
    if let Some(workdir) = &config.podcast.workdir {
        assembler = assembler.with_workdir_root(workdir);
    }

    let generator =
        PodcastGenerator::new(assembler).with_max_chunk_chars(config.podcast.max_chunk_chars);

    let report = generator
        .generate(input, output, policy.as_ref(), costs)
        .await
        .with_context(|| format!("Failed to narrate {}", input.display()))?;

    tracing::info!(
        output = %report.output_path.display(),
        chunks = report.chunk_count,
        skipped = report.skipped_chunks.len(),
        characters = report.characters,
        cost = report.cost,
        "Podcast written"
    );

    Ok(report)
}

async fn run_pipeline(config: &Config) -> anyhow::Result<()> {
    let mut episode = summarize(config).await?;

    let mut speech_costs = CostTracker::new();
    let report = podcast(config, &episode.paths.transcript, None, &mut speech_costs).await;
    episode.costs.absorb(speech_costs);
    let report = report
        .inspect_err(|_| tracing::warn!(total_cost = episode.cost(), "Episode audio failed"))?;

    tracing::info!(
        title = %episode.title,
        audio = %report.output_path.display(),
        total_cost = episode.cost(),
        "Episode complete"
    );

    Ok(())
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!(
        max_stories = config.summary.max_stories,
        "Running scheduled pipeline..."
    );
    run_pipeline(&config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping after the current request");
                cancel.cancel();
            }
        }
    });

    let config = |summary, podcast| Config {
        credentials: cli.credentials.clone(),
        timezone: cli.timezone,
        summary,
        podcast,
        cancel: cancel.clone(),
    };

    match cli.command {
        Command::Summarize { ref summary } => {
            let config = config(summary.clone(), PodcastConfig::default());
            summarize(&config).await?;
        }
        Command::Podcast {
            ref input,
            ref output,
            ref podcast,
        } => {
            let config = config(SummaryConfig::default(), podcast.clone());
            self::podcast(&config, input, output.as_deref(), &mut CostTracker::new()).await?;
        }
        Command::Run {
            ref summary,
            ref podcast,
        } => {
            let config = config(summary.clone(), podcast.clone());
            run_pipeline(&config).await?;
        }
        Command::Cron {
            ref schedule,
            ref summary,
            ref podcast,
        } => {
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(schedule)?;
            let config = config(summary.clone(), podcast.clone());

            let worker = WorkerBuilder::new("hacker-pulse-cron")
                .backend(CronStream::new(schedule))
                .retry(RetryPolicy::retries(3))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
    }

    Ok(())
}

