use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use chrono::Local;
use chrono::Utc;
use clap::Parser;
use snapday_journal::carousel::Carousel;
use snapday_journal::clock::Clock;
use snapday_journal::clock::SystemClock;
use snapday_journal::config::JournalConfig;
use snapday_journal::countdown::format_remaining;
use snapday_journal::countdown::start_countdown;
use snapday_journal::factory;
use snapday_journal::gate::CaptureOutcome;
use snapday_journal::gate::EligibilityGate;
use snapday_journal::gate::OpenState;
use snapday_journal::migrate::copy_store;
use snapday_journal::scheduler::AlarmRegistry;
use snapday_journal::scheduler::ReminderScheduler;
use snapday_journal::timelapse::compile_timelapse;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use crate::collaborators::FileCapture;
use crate::collaborators::FrameDirSink;
use crate::collaborators::StdoutNotifier;
use crate::collaborators::TerminalView;

/// One snapshot a day, with a message.
#[derive(Debug, Parser)]
#[command(name = "snapday", version)]
pub struct SnapdayCli {
    #[command(subcommand)]
    pub cmd: SnapdayCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SnapdayCommand {
    /// Save today's entry from an image file and a message.
    Capture {
        #[arg(long, short)]
        message: String,
        /// Image file standing in for the webcam frame
        #[arg(long)]
        image: PathBuf,
    },
    /// List stored entries, oldest first.
    List {
        /// Print entries as JSON (without image payloads)
        #[arg(long)]
        json: bool,
    },
    /// Delete the entry at an index shown by `list`.
    Delete { index: usize },
    /// Step through past entries one at a time, reading `n`, `p`, `d` or `q`
    /// from stdin.
    Browse,
    /// Show whether a new entry can be made now.
    Status,
    /// Show a live countdown until the next entry is allowed.
    Countdown,
    /// Run the background reminder.
    Remind {
        /// Check once and exit instead of polling
        #[arg(long)]
        once: bool,
    },
    /// Write all stored images as timelapse frames.
    Timelapse {
        /// Output directory for frames and the ffmpeg concat manifest
        #[arg(long)]
        out: PathBuf,
    },
    /// Copy the persisted store into another backend.
    Migrate {
        /// Destination data directory
        #[arg(long)]
        to: PathBuf,
        /// Destination backend: json or sqlite
        #[arg(long, default_value = "sqlite")]
        backend: String,
    },
}

fn migrate_backend(name: &str) -> anyhow::Result<factory::Backend> {
    match name.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(factory::Backend::Json),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(factory::Backend::Sqlite),
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => anyhow::bail!("sqlite backend not compiled; rebuild with --features sqlite"),
        other => anyhow::bail!("unknown migrate backend {other:?}; expected json or sqlite"),
    }
}

fn local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Execute a snapday command.
pub async fn run(cli: SnapdayCli) -> anyhow::Result<()> {
    let config = JournalConfig::load()?;
    tracing::debug!(data_dir = %config.data_dir.display(), backend = ?config.backend, "config loaded");
    let store = Arc::new(factory::open_store(&config.data_dir, config.backend)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gate = EligibilityGate::new(Arc::clone(&store), Arc::clone(&clock));

    match cli.cmd {
        SnapdayCommand::Capture { message, image } => {
            match gate
                .attempt_capture(&message, &FileCapture::new(image))
                .await?
            {
                CaptureOutcome::Saved(entry) => {
                    println!("Saved entry for {}", local(entry.date));
                }
                CaptureOutcome::Rejected { deadline } => {
                    println!(
                        "You can only make one entry per day. Next entry available in {} (at {}).",
                        format_remaining(deadline - clock.now()),
                        local(deadline)
                    );
                }
            }
        }
        SnapdayCommand::List { json } => {
            let entries = gate.repository().list().await?;
            if json {
                let items: Vec<_> = entries
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "message": e.message,
                            "date": e.date,
                            "image_bytes": e.image.byte_len(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&items)?);
            } else if entries.is_empty() {
                println!("No entries yet.");
            } else {
                for (i, e) in entries.iter().enumerate() {
                    println!(
                        "{i}\t{}\t{}\t{} bytes",
                        local(e.date),
                        e.message,
                        e.image.byte_len()
                    );
                }
            }
        }
        SnapdayCommand::Delete { index } => {
            let removed = gate.repository().delete_at(index).await?;
            println!("Deleted entry {index} from {}", local(removed.date));
        }
        SnapdayCommand::Browse => {
            let repo = gate.repository();
            let mut carousel = Carousel::default();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let entries = repo.list().await?;
                carousel.sync_len(entries.len());
                let Some((index, entry)) = carousel
                    .current()
                    .and_then(|i| entries.get(i).map(|e| (i, e)))
                else {
                    println!("No entries yet.");
                    break;
                };
                println!(
                    "[{}/{}] {}\t{}",
                    index + 1,
                    carousel.len(),
                    local(entry.date),
                    entry.message
                );
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                match line.trim() {
                    "n" | "next" => {
                        carousel.next();
                    }
                    "p" | "prev" => {
                        carousel.prev();
                    }
                    "d" | "delete" => {
                        repo.delete_at(index).await?;
                        println!("Deleted entry {index}");
                    }
                    "q" | "quit" => break,
                    other => println!("Unknown input {other:?}; use n, p, d or q."),
                }
            }
        }
        SnapdayCommand::Status => match gate.on_open().await? {
            OpenState::Open => println!("Ready: you can take today's snapshot."),
            OpenState::Closed { deadline } => println!(
                "Closed until {} ({} left).",
                local(deadline),
                format_remaining(deadline - clock.now())
            ),
            OpenState::Reopened => println!("Available now: you can take a new snapshot."),
        },
        SnapdayCommand::Countdown => match gate.on_open().await? {
            OpenState::Closed { deadline } => {
                let handle = start_countdown(
                    gate.clone(),
                    deadline,
                    Arc::new(TerminalView),
                    Duration::from_secs(1),
                );
                tokio::select! {
                    _ = handle.finished() => {}
                    _ = tokio::signal::ctrl_c() => println!(),
                }
            }
            OpenState::Open | OpenState::Reopened => {
                println!("Ready: you can take today's snapshot.");
            }
        },
        SnapdayCommand::Remind { once } => {
            let scheduler = Arc::new(ReminderScheduler::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::new(StdoutNotifier),
                &config,
            ));
            let fired = scheduler.tick().await?;
            if once {
                if !fired {
                    println!("Nothing due.");
                }
                return Ok(());
            }
            let registry = AlarmRegistry::new();
            scheduler.install(&registry);
            tracing::info!(period = ?config.reminder_period, "reminder running");
            tokio::signal::ctrl_c().await?;
        }
        SnapdayCommand::Timelapse { out } => {
            let sink = FrameDirSink::create(&out)?;
            let (frames, manifest) = compile_timelapse(gate.repository(), sink).await?;
            println!("Wrote {frames} frames; manifest at {}", manifest.display());
            println!(
                "Encode with: ffmpeg -f concat -safe 0 -i {} timelapse.webm",
                manifest.display()
            );
        }
        SnapdayCommand::Migrate { to, backend } => {
            let target = factory::open_store(&to, migrate_backend(&backend)?)?;
            let n = copy_store(store.as_ref(), &target).await?;
            println!("Copied {n} keys");
        }
    }
    Ok(())
}
