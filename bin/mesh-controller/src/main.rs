use anyhow::Result;
use clap::{Parser, ValueEnum};
use kube::Client;
use mesh_approval::Approver;
use mesh_core::{NoopTranslator, Snapshot};
use mesh_extensions::{inputs_from_snapshot, DialOptions, ExtensionClients, OutputSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod snapshot_loader;
mod status_writer;
mod triggers;

use snapshot_loader::SnapshotLoader;
use status_writer::StatusWriter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Name of the Settings object
    #[arg(long, env = "MESH_SETTINGS_NAME", default_value = "settings")]
    settings_name: String,

    /// Namespace of the Settings object
    #[arg(long, env = "MESH_SETTINGS_NAMESPACE", default_value = "mesh-system")]
    settings_namespace: String,

    /// Run an approval pass at least this often
    #[arg(long, env = "MESH_RESYNC_INTERVAL_SECS", default_value_t = 60)]
    resync_interval_secs: u64,

    /// Wait before re-opening a failed extension push stream
    #[arg(long, env = "MESH_PUSH_RECONNECT_DELAY_MS", default_value_t = 1000)]
    push_reconnect_delay_ms: u64,

    #[arg(long, env = "MESH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Run approval without writing status back
    #[arg(long, env = "MESH_DRY_RUN")]
    dry_run: bool,
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

struct Controller {
    loader: SnapshotLoader,
    writer: StatusWriter,
    approver: Approver<NoopTranslator>,
    extensions: ExtensionClients,
}

impl Controller {
    async fn run_pass(&self) -> Result<()> {
        let before = self.loader.load().await?;
        let mut snapshot = before.clone();
        self.approver.approve(&mut snapshot);

        let changed = self.writer.write(&before, &snapshot).await?;
        info!(changed, "Approval pass complete");

        self.patch_extensions(&snapshot).await
    }

    async fn patch_extensions(&self, snapshot: &Snapshot) -> Result<()> {
        if self.extensions.is_empty() {
            return Ok(());
        }
        let inputs = inputs_from_snapshot(snapshot)?;
        let mut outputs = OutputSet::new();
        self.extensions.patch_outputs(&inputs, &mut outputs).await?;
        debug!(
            objects = outputs.len(),
            kinds = ?outputs.kinds().collect::<Vec<_>>(),
            "Extension servers patched outputs"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    info!("Starting mesh-controller v{}", env!("CARGO_PKG_VERSION"));
    if args.dry_run {
        info!("Dry run enabled, status will not be written");
    }

    let client = Client::try_default().await?;
    let loader = SnapshotLoader::new(
        client.clone(),
        args.settings_name.clone(),
        args.settings_namespace.clone(),
    );

    let dial_options: Vec<DialOptions> = loader
        .settings()
        .await?
        .iter()
        .flat_map(|settings| settings.spec.extensions.grpc_servers.iter())
        .map(DialOptions::from)
        .collect();
    let extensions = ExtensionClients::connect(&dial_options)
        .await?
        .with_reconnect_delay(Duration::from_millis(args.push_reconnect_delay_ms));

    let notify = Arc::new(Notify::new());
    let cancel = CancellationToken::new();
    let mut tasks = triggers::spawn_watchers(&client, notify.clone(), cancel.clone());
    tasks.extend(
        extensions.watch_push_notifications(cancel.clone(), triggers::push_trigger(notify.clone())),
    );

    let controller = Controller {
        loader,
        writer: StatusWriter::new(client, args.dry_run),
        approver: Approver::new(NoopTranslator),
        extensions,
    };

    let mut resync = tokio::time::interval(Duration::from_secs(args.resync_interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, exiting...");
                break;
            }
            _ = resync.tick() => debug!("Resync interval elapsed"),
            _ = notify.notified() => debug!("Change notification received"),
        }

        if let Err(e) = controller.run_pass().await {
            error!("Approval pass failed: {:#}", e);
        }
    }

    cancel.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            error!("Background task failed: {}", e);
        }
    }

    Ok(())
}
