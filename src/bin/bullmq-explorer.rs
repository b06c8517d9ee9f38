//! bullmq-explorer CLI: operator interface to the queue introspection engine.

use bullmq_explorer::config::Config;
use bullmq_explorer::engine::{AutoRefresh, Explorer, Snapshot};
use bullmq_explorer::model::{
    DeleteOutcome, Job, JobFilter, JobPage, Payload, Queue, ServerHealth, Status, StatusCounts,
    StatusFilter,
};
use bullmq_explorer::store::RedisStore;
use bullmq_explorer::telemetry::{TelemetryConfig, init_telemetry};
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "bullmq-explorer", about = "Inspect BullMQ queues stored in Redis")]
struct Cli {
    /// Redis connection URL (overrides REDIS_URL)
    #[arg(long, global = true)]
    url: Option<String>,
    /// Key namespace prefix (overrides QUEUE_PREFIX)
    #[arg(long, global = true)]
    prefix: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List queues found under the prefix
    Queues,
    /// Show job counts per status
    Counts { queue: String },
    /// List jobs of a queue
    List {
        queue: String,
        #[command(flatten)]
        view: ViewArgs,
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Jobs per page (defaults to PAGE_SIZE)
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Show one job in full
    Show { queue: String, id: String },
    /// Delete a job from every collection, with its record and logs
    Delete { queue: String, id: String },
    /// Show server version, mode, memory and clients
    Info,
    /// Re-read counts and the first page on an interval until Ctrl-C
    Watch {
        queue: String,
        #[command(flatten)]
        view: ViewArgs,
        /// Refresh interval in milliseconds (defaults to REFRESH_INTERVAL_MS)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[derive(clap::Args)]
struct ViewArgs {
    /// Status to list: waiting, active, delayed, completed, failed, paused or all
    #[arg(long, default_value = "all")]
    status: String,
    /// Case-insensitive match against job id or payload
    #[arg(long)]
    search: Option<String>,
}

impl ViewArgs {
    fn filter(&self, page: u32, page_size: u32) -> anyhow::Result<JobFilter> {
        let status: StatusFilter = self.status.parse()?;
        let mut filter = JobFilter::new().status(status).page(page).page_size(page_size);
        if let Some(ref term) = self.search {
            filter = filter.search(term);
        }
        Ok(filter)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env_with_url(cli.url)?;
    if let Some(prefix) = cli.prefix {
        config.prefix = prefix;
    }

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "bullmq-explorer".to_string(),
        default_level: config.log_level.clone(),
    })?;

    let explorer = Explorer::from_config(&config).await?;
    let queue_of = |name: String| Queue::new(config.prefix.clone(), name);

    match cli.command {
        Command::Queues => cmd_queues(&explorer, &config.prefix).await,
        Command::Counts { queue } => cmd_counts(&explorer, &queue_of(queue)).await,
        Command::List {
            queue,
            view,
            page,
            page_size,
        } => {
            let filter = view.filter(page, page_size.unwrap_or(config.page_size))?;
            cmd_list(&explorer, &queue_of(queue), &filter).await
        }
        Command::Show { queue, id } => cmd_show(&explorer, &queue_of(queue), &id).await,
        Command::Delete { queue, id } => cmd_delete(&explorer, &queue_of(queue), &id).await,
        Command::Info => cmd_info(&explorer).await,
        Command::Watch {
            queue,
            view,
            interval_ms,
        } => {
            let filter = view.filter(1, config.page_size)?;
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or(config.refresh_interval);
            cmd_watch(explorer, queue_of(queue), filter, interval).await
        }
    }
}

async fn cmd_queues(explorer: &Explorer<RedisStore>, prefix: &str) -> anyhow::Result<()> {
    let queues = explorer.discover(prefix).await?;
    if queues.is_empty() {
        println!("No queues found under prefix '{prefix}'.");
        return Ok(());
    }
    for queue in &queues {
        println!("{}", queue.name);
    }
    println!("\n{} queue(s)", queues.len());
    Ok(())
}

async fn cmd_counts(explorer: &Explorer<RedisStore>, queue: &Queue) -> anyhow::Result<()> {
    let counts = explorer.counts_by_status(queue).await?;
    print_counts(&counts);
    Ok(())
}

async fn cmd_list(
    explorer: &Explorer<RedisStore>,
    queue: &Queue,
    filter: &JobFilter,
) -> anyhow::Result<()> {
    let page = explorer.list_jobs(queue, filter).await?;
    print_page(&page, filter);
    Ok(())
}

async fn cmd_show(
    explorer: &Explorer<RedisStore>,
    queue: &Queue,
    id: &str,
) -> anyhow::Result<()> {
    let Some(detail) = explorer.detail(queue, id).await? else {
        println!("Job '{id}' not found in {queue} (it may have just finished or been removed).");
        return Ok(());
    };

    let statuses = if detail.statuses.is_empty() {
        "-".to_string()
    } else {
        detail
            .statuses
            .iter()
            .map(Status::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };

    println!("ID:         {}", detail.id);
    println!("Name:       {}", detail.name);
    println!("Status:     {statuses}");
    println!("Created:    {}", format_timestamp(&detail.job));
    println!("Attempts:   {}", detail.job.attempts_made);
    if let Some(ref reason) = detail.job.failed_reason {
        println!("Failed:     {reason}");
    }
    if let Payload::Raw { ref error, .. } = detail.job.payload {
        println!("Decode:     {error}");
    }
    println!("---");
    println!("{}", detail.data_pretty);
    Ok(())
}

async fn cmd_delete(
    explorer: &Explorer<RedisStore>,
    queue: &Queue,
    id: &str,
) -> anyhow::Result<()> {
    match explorer.delete(queue, id).await? {
        DeleteOutcome::Deleted {
            removed_from,
            record_removed,
        } => {
            let from: Vec<String> = removed_from.iter().map(Status::to_string).collect();
            println!(
                "Deleted {id} (collections: {}; record: {})",
                if from.is_empty() {
                    "-".to_string()
                } else {
                    from.join(",")
                },
                if record_removed { "removed" } else { "absent" }
            );
        }
        DeleteOutcome::NotFoundAnywhere => println!("Job '{id}' was already gone."),
    }
    Ok(())
}

async fn cmd_info(explorer: &Explorer<RedisStore>) -> anyhow::Result<()> {
    print_health(&explorer.probe().await?);
    Ok(())
}

async fn cmd_watch(
    explorer: Explorer<RedisStore>,
    queue: Queue,
    filter: JobFilter,
    interval: Duration,
) -> anyhow::Result<()> {
    let (handle, mut snapshots) = AutoRefresh::new(explorer, queue.clone(), filter.clone())
        .interval(interval)
        .spawn();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = snapshots.recv() => match next {
                Some(Ok(snapshot)) => print_snapshot(&queue, &snapshot, &filter),
                Some(Err(e)) => eprintln!("refresh failed: {e}"),
                None => break,
            },
        }
    }

    handle.stop().await;
    Ok(())
}

fn print_counts(counts: &StatusCounts) {
    for status in Status::ALL {
        println!("{:<10} {:>8}", status.to_string(), counts.get(status));
    }
    println!("{:<10} {:>8}", "total", counts.total());
}

fn format_timestamp(job: &Job) -> String {
    job.timestamp
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_page(page: &JobPage, filter: &JobFilter) {
    if page.jobs.is_empty() {
        println!("No jobs found.");
    } else {
        println!(
            "{:<12}  {:<20}  {:<10}  {:<19}  DATA",
            "ID", "NAME", "STATUS", "CREATED"
        );
        println!("{}", "-".repeat(100));
        for job in &page.jobs {
            println!(
                "{:<12}  {:<20}  {:<10}  {:<19}  {}",
                job.id,
                job.name,
                job.status.map(|s| s.to_string()).unwrap_or_default(),
                format_timestamp(job),
                job.payload.preview()
            );
        }
    }
    println!(
        "\npage {}/{}, {} matching job(s)",
        filter.page,
        page.total_pages(filter.page_size),
        page.total_matching
    );
}

fn print_health(health: &ServerHealth) {
    println!("Version:    {}", health.version_display());
    println!("Mode:       {}", health.mode_display());
    println!(
        "Memory:     {} / {}",
        health.used_memory_display(),
        health.total_memory_display()
    );
    println!("Clients:    {}", health.clients_display());
}

fn print_snapshot(queue: &Queue, snapshot: &Snapshot, filter: &JobFilter) {
    println!(
        "=== {queue} @ {} ===",
        snapshot.taken_at.format("%Y-%m-%d %H:%M:%S")
    );
    print_health(&snapshot.health);
    println!();
    print_counts(&snapshot.counts);
    println!();
    print_page(&snapshot.page, filter);
    println!();
}
