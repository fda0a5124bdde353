mod commands;
mod view;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use objview::view::ViewSink;
use objview::{backend, loader, shutdown_channel, Dimensions, EventLoop, RenderController, RenderTarget};
use tokio::sync::mpsc;

use crate::view::{MultiView, PngSnapshot, TevView};

#[derive(Parser, Debug)]
#[command(
    name = "objview",
    about = "Stream a PBR-shaded view of an OBJ file to tev, with live controls on stdin"
)]
struct Args {
    /// OBJ file to view
    #[arg(short, long)]
    data: PathBuf,

    /// Render library name. "environment" defers to OBJVIEW_LIBRARY.
    #[arg(short = 'l', long, default_value = "environment")]
    library: String,

    /// Frame size in format `width`x`height`
    #[arg(long, default_value = "800x600")]
    dimensions: Dimensions,

    /// Period of the background view refresh, in milliseconds
    #[arg(long, default_value_t = 100)]
    refresh_ms: u64,

    /// Where fresh frames go (defaults to tev when not given)
    #[arg(short, long, value_enum)]
    output: Vec<AvailableOutput>,

    /// Hostname of a running tev instance
    #[arg(long)]
    tev_hostname: Option<String>,

    /// Path to the tev executable, spawned when no instance is reachable
    #[arg(long)]
    tev_path: Option<String>,

    /// Directory the `file` output writes its snapshot into
    #[arg(long, default_value = "output")]
    snapshot_dir: PathBuf,
}

#[derive(clap::ValueEnum, Default, Debug, Clone, Copy, PartialEq, Eq)]
enum AvailableOutput {
    #[default]
    Tev,
    File,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    log::info!("loading scene from {}", args.data.display());
    let scene = loader::load_obj(&args.data)?;
    let backend = backend::resolve(&args.library)?;
    let target = RenderTarget::new(scene, args.dimensions, backend);

    let outputs = if args.output.is_empty() {
        vec![AvailableOutput::Tev]
    } else {
        args.output.clone()
    };

    let mut views: Vec<Box<dyn ViewSink>> = Vec::new();
    if outputs.contains(&AvailableOutput::Tev) {
        views.push(Box::new(TevView::new(
            args.dimensions,
            args.tev_path.clone(),
            args.tev_hostname.clone(),
        )?));
    }

    let mut controller = RenderController::new(target, Box::new(MultiView::new(views)));
    // first frame; the loop only keeps it fresh
    controller.refresh()?;

    let (events_tx, events_rx) = mpsc::channel(64);
    let (shutdown_handle, shutdown) = shutdown_channel();
    let event_loop = EventLoop::new(
        controller,
        events_rx,
        Duration::from_millis(args.refresh_ms),
        shutdown,
    )?;

    let input = tokio::spawn(commands::pump_stdin(events_tx, shutdown_handle));

    let controller = event_loop.run().await?;
    input.abort();

    if outputs.contains(&AvailableOutput::File) {
        PngSnapshot {
            outdir: args.snapshot_dir.clone(),
        }
        .commit(controller.target().frame())?;
    }

    log::info!("clean shutdown");
    Ok(())
}
