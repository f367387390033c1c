use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gutterguard_core::{
    aggregate, Cancellation, Coordinates, CredentialSource, DashboardConfig, DashboardMonitor,
    DashboardSnapshot, DeviceStore, FileStore, FirebaseStore, Granularity, LoginGate,
    MaintenanceStatus, NewDevice,
};
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod report;
mod viewer;

#[derive(Debug, Parser)]
#[command(name = "gutterguard")]
#[command(about = "Gutter monitoring admin dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    store: StoreArgs,

    #[arg(long, global = true, default_value = gutterguard_core::config::DEFAULT_COLLECTION_PATH)]
    collection_path: String,

    /// Store path of the admin credential record; the built-in pair is used when omitted.
    #[arg(long, global = true)]
    credentials_path: Option<String>,

    #[arg(long, global = true, default_value_t = 30)]
    refresh_secs: u64,

    #[arg(long, global = true, default_value_t = 10_000)]
    fetch_timeout_ms: u64,

    #[arg(long, global = true, default_value_t = 90)]
    stale_after_secs: u64,

    #[arg(long, global = true, default_value_t = 900)]
    inactivity_secs: u64,
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Realtime database root, e.g. https://<project>.firebaseio.com
    #[arg(long, global = true, env = "GUTTERGUARD_DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, global = true, env = "GUTTERGUARD_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Read and write a local JSON export instead of the remote database.
    /// Takes precedence over --database-url.
    #[arg(long, global = true)]
    data_file: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Device inventory with clog and maintenance status.
    Devices {
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Clog history, one row per event.
    History {
        #[arg(long)]
        device: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 8)]
        per_page: usize,
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Maintenance tallies and clogged gutter count.
    Summary {
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Map markers for devices with usable coordinates.
    Markers {
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Clogged/cleared counts per time bucket.
    Buckets {
        #[arg(long, default_value = "hour")]
        granularity: Granularity,
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Set a device's maintenance status.
    SetMaintenance {
        device_id: String,
        #[arg(value_enum)]
        status: MaintenanceArg,
    },
    /// Register a new device with no clog readings.
    AddDevice {
        id: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, requires = "longitude", allow_negative_numbers = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_negative_numbers = true)]
        longitude: Option<f64>,
    },
    /// Check an admin username/password pair.
    Login {
        username: String,
        password: String,
    },
    /// Refresh periodically and print each snapshot.
    Watch {
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
    /// Interactive terminal dashboard.
    View,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Ndjson,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MaintenanceArg {
    Pending,
    Inprogress,
    Nomaintenancereq,
}

impl From<MaintenanceArg> for MaintenanceStatus {
    fn from(value: MaintenanceArg) -> Self {
        match value {
            MaintenanceArg::Pending => MaintenanceStatus::Pending,
            MaintenanceArg::Inprogress => MaintenanceStatus::InProgress,
            MaintenanceArg::Nomaintenancereq => MaintenanceStatus::NoMaintenanceRequired,
        }
    }
}

impl Cli {
    fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            collection_path: self.collection_path.clone(),
            credentials_path: self.credentials_path.clone(),
            refresh_interval: Duration::from_secs(self.refresh_secs.max(1)),
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            stale_after: Duration::from_secs(self.stale_after_secs),
            inactivity_timeout: Duration::from_secs(self.inactivity_secs),
        }
    }

}

impl StoreArgs {
    fn open(&self, timeout: Duration) -> Result<Arc<dyn DeviceStore>> {
        let store: Arc<dyn DeviceStore> = if let Some(path) = &self.data_file {
            Arc::new(FileStore::new(path))
        } else {
            let Some(url) = &self.database_url else {
                bail!("set --database-url (or GUTTERGUARD_DATABASE_URL) or pass --data-file");
            };
            Arc::new(FirebaseStore::new(url.clone(), self.auth_token.clone(), timeout)?)
        };
        info!(source = %store.describe(), "store opened");
        Ok(store)
    }
}

fn login_gate(config: &DashboardConfig) -> LoginGate {
    let source = match &config.credentials_path {
        Some(path) => CredentialSource::Store { path: path.clone() },
        None => CredentialSource::default(),
    };
    LoginGate::new(source, config.inactivity_timeout)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.dashboard_config();
    let timeout = Duration::from_millis(cli.fetch_timeout_ms);
    let store_args = cli.store;
    let open_store = || store_args.open(timeout);

    match cli.command {
        Command::Devices { format } => {
            let snapshot = fetch_once(&open_store()?, &config).await?;
            let rows = report::device_rows(&snapshot.devices);
            match format {
                OutputFormat::Human => print!("{}", report::device_table(&rows)),
                _ => write_rows(&mut io::stdout().lock(), &rows, format)?,
            }
        }
        Command::History {
            device,
            page,
            per_page,
            format,
        } => {
            let snapshot = fetch_once(&open_store()?, &config).await?;
            let rows = report::history_rows(&snapshot.devices, device.as_deref());
            let shown = report::page(&rows, page, per_page);
            match format {
                OutputFormat::Human => {
                    print!("{}", report::history_table(shown));
                    let pages = rows.len().div_ceil(per_page.max(1)).max(1);
                    println!("page {}/{} ({} events)", page + 1, pages, rows.len());
                }
                _ => write_rows(&mut io::stdout().lock(), shown, format)?,
            }
        }
        Command::Summary { format } => {
            let snapshot = fetch_once(&open_store()?, &config).await?;
            match format {
                OutputFormat::Human => print!("{}", report::summary_text(&snapshot.summary)),
                _ => print_json(&snapshot.summary, format)?,
            }
        }
        Command::Markers { format } => {
            let snapshot = fetch_once(&open_store()?, &config).await?;
            let markers = report::markers(&snapshot.devices);
            match format {
                OutputFormat::Human => {
                    let center = snapshot.devices.map_center();
                    println!("center: {:.6}, {:.6}", center.latitude, center.longitude);
                    for marker in &markers {
                        let icon = if marker.clogged { "[X]" } else { "[ ]" };
                        println!(
                            "{icon} {:.6}, {:.6}  {}",
                            marker.latitude,
                            marker.longitude,
                            marker.popup.join(" | ")
                        );
                    }
                }
                _ => write_rows(&mut io::stdout().lock(), &markers, format)?,
            }
        }
        Command::Buckets {
            granularity,
            format,
        } => {
            let snapshot = fetch_once(&open_store()?, &config).await?;
            let now = chrono::Local::now().naive_local();
            let series = aggregate(snapshot.devices.histories(), granularity, now);
            match format {
                OutputFormat::Human => print!("{}", report::series_table(&series)),
                _ => print_json(&series, format)?,
            }
        }
        Command::SetMaintenance { device_id, status } => {
            let monitor = DashboardMonitor::new(open_store()?, config);
            monitor
                .set_maintenance(&device_id, status.into())
                .await
                .with_context(|| format!("updating maintenance status of {device_id}"))?;
            println!("{device_id}: {}", MaintenanceStatus::from(status));
        }
        Command::AddDevice {
            id,
            name,
            address,
            latitude,
            longitude,
        } => {
            let coordinates = latitude.zip(longitude).map(|(latitude, longitude)| Coordinates {
                latitude,
                longitude,
            });
            let monitor = DashboardMonitor::new(open_store()?, config);
            monitor
                .register_device(&NewDevice {
                    id: id.clone(),
                    name,
                    address,
                    coordinates,
                })
                .await
                .with_context(|| format!("registering device {id}"))?;
            println!("{id}: registered");
        }
        Command::Login { username, password } => {
            let mut gate = login_gate(&config);
            let now = std::time::Instant::now();
            let logged_in = if gate.requires_store() {
                let store = open_store()?;
                gate.submit(store.as_ref(), &username, &password, now).await
            } else {
                gate.submit_offline(&username, &password, now)
            };
            if !logged_in {
                bail!("{}", gate.error().unwrap_or("login failed"));
            }
            println!("logged in as {username}");
        }
        Command::Watch { format } => {
            let mut monitor = DashboardMonitor::new(open_store()?, config);
            stream_loop(&mut monitor, format).await?;
        }
        Command::View => {
            let gate = login_gate(&config);
            viewer::run_viewer(open_store()?, config, gate).await?;
        }
    }

    Ok(())
}

async fn fetch_once(store: &Arc<dyn DeviceStore>, config: &DashboardConfig) -> Result<DashboardSnapshot> {
    let mut monitor = DashboardMonitor::new(Arc::clone(store), config.clone());
    let snapshot = monitor.tick(&Cancellation::never()).await;
    if !snapshot.status.is_ok() {
        bail!("fetch failed: {}", snapshot.status.failures.join(", "));
    }
    Ok(snapshot)
}

async fn stream_loop<S: DeviceStore>(
    monitor: &mut DashboardMonitor<S>,
    format: OutputFormat,
) -> Result<()> {
    let (_handle, cancel) = Cancellation::new();
    let start = Instant::now() + Duration::from_millis(50);
    let mut ticker = interval_at(start, monitor.refresh_interval());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("received ctrl-c, stopping");
                break;
            }
            _ = ticker.tick() => {
                let snapshot = monitor.tick(&cancel).await;
                print_snapshot(&snapshot, format)?;
                info!(status = %snapshot.status.code, devices = snapshot.summary.devices, stale = %snapshot.freshness.stale, "tick");
            }
        }
    }

    Ok(())
}

/// `ndjson` puts one row per line; `json` prints the rows as one array.
fn write_rows<T: serde::Serialize, W: Write>(out: &mut W, rows: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Ndjson => {
            for row in rows {
                serde_json::to_writer(&mut *out, row)?;
                writeln!(out)?;
            }
        }
        _ => {
            serde_json::to_writer_pretty(&mut *out, rows)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Ndjson => println!("{}", serde_json::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn print_snapshot(snapshot: &DashboardSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Ndjson => print_json(snapshot, format)?,
        OutputFormat::Human => {
            println!("=== GutterGuard Snapshot ===");
            println!("Time:       {}", snapshot.ts.to_rfc3339());
            println!("Source:     {}", snapshot.source);
            println!(
                "State:      status={} stale={} age_ms={} rtt_ms={} reads_ok={} reads_err={}",
                snapshot.status.code,
                snapshot.freshness.stale,
                snapshot.freshness.age_ms,
                snapshot.freshness.rtt_ms,
                snapshot.quality.reads_ok,
                snapshot.quality.reads_err,
            );
            if !snapshot.status.failures.is_empty() {
                println!("Failures:   {}", snapshot.status.failures.join(", "));
            }
            print!("{}", report::summary_text(&snapshot.summary));
        }
    }
    Ok(())
}
