//! Command-line host: drives the orchestrator against the HTTP object service

use crate::api::HttpObjectApi;
use crate::config::{build_config, ConfigInput};
use crate::orchestrator::{Orchestrator, SelectionDownload};
use crate::save::DirectorySaver;
use crate::store::{TransferStore, UploadFile, UploadStatus};
use crate::tray::{DismissOutcome, TrayPresenter, TrayView};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "filetray", version, about = "Upload, export and download files")]
pub struct Cli {
    /// JSON config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Object service base URL (overrides config and FILETRAY_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Bearer token
    #[arg(long)]
    pub token: Option<String>,

    /// Where downloads are saved
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload files, one at a time, in the given order
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Folder to upload into
        #[arg(long)]
        parent: Option<String>,
    },
    /// Download objects: one directly, several as a zip export
    Download {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete objects
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

async fn load_config(cli: &Cli) -> anyhow::Result<crate::config::Config> {
    let mut input = match &cli.config {
        Some(path) => ConfigInput::from_file(path).await?,
        None => ConfigInput::default(),
    }
    .with_env();
    if let Some(url) = &cli.base_url {
        input.base_url = Some(url.clone());
    }
    if let Some(token) = &cli.token {
        input.token = Some(token.clone());
    }
    if let Some(dir) = &cli.download_dir {
        input.download_dir = Some(dir.display().to_string());
    }
    Ok(build_config(input)?)
}

pub fn render_tray(view: &TrayView) -> String {
    let mut out = String::new();
    let header: &str = if view.header.is_empty() { "Transfers" } else { &view.header };
    out.push_str(&format!("[tray] {}\n", header));
    if !view.expanded {
        return out;
    }
    if !view.downloads.is_empty() {
        out.push_str("  Download\n");
        for row in &view.downloads {
            out.push_str(&format!("    {} {}\n", row.icon.glyph(), row.name));
        }
    }
    if !view.uploads.is_empty() {
        out.push_str("  Upload\n");
        for row in &view.uploads {
            out.push_str(&format!("    {} {}\n", row.icon.glyph(), row.name));
        }
    }
    if let Some(warning) = &view.warning {
        out.push_str(&format!("  ! {}: {}\n", warning.title, warning.description));
    }
    out
}

/// Print the tray whenever it changes; hands the presenter back when stopped.
fn spawn_renderer(
    store: TransferStore,
    mut tray: TrayPresenter,
    token: CancellationToken,
) -> JoinHandle<TrayPresenter> {
    tokio::spawn(async move {
        let mut updates = store.subscribe();
        let mut last: Option<TrayView> = None;
        loop {
            let state = updates.borrow_and_update().clone();
            tray.observe(&state);
            let view = tray.view(&state);
            if view.visible && last.as_ref() != Some(&view) {
                print!("{}", render_tray(&view));
            }
            last = Some(view);

            tokio::select! {
                _ = token.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tray
    })
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli).await?;
    let api = Arc::new(HttpObjectApi::new(&config.api)?);
    let saver = Arc::new(DirectorySaver::new(config.transfer.download_dir.clone()));
    let orchestrator = Orchestrator::start(api, saver, &config.transfer);

    let render_token = CancellationToken::new();
    let renderer = spawn_renderer(
        orchestrator.store().clone(),
        TrayPresenter::new(orchestrator.store().clone(), config.transfer.tray_min_width),
        render_token.clone(),
    );

    let outcome = execute(&orchestrator, cli.command).await;
    if outcome.is_ok() {
        orchestrator.wait_until_idle().await;
    }

    let failed_uploads = orchestrator
        .store()
        .snapshot()
        .upload_queue
        .iter()
        .filter(|item| item.status == UploadStatus::Failed)
        .count();

    render_token.cancel();
    let mut tray = renderer.await.context("tray renderer stopped unexpectedly")?;
    if tray.dismiss() == DismissOutcome::NeedsConfirmation {
        tray.confirm_warning();
    }
    orchestrator.shutdown().await;

    outcome?;
    if failed_uploads > 0 {
        bail!("{} upload(s) failed", failed_uploads);
    }
    Ok(())
}

async fn execute(orchestrator: &Orchestrator, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Upload { paths, parent } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                let file = UploadFile::from_path(path)
                    .await
                    .with_context(|| format!("cannot read {}", path.display()))?;
                files.push(file);
            }
            orchestrator.enqueue_uploads(files, parent);
        }
        Command::Download { ids } => match orchestrator.download_selection(&ids).await? {
            SelectionDownload::Saved(path) => println!("saved {}", path.display()),
            SelectionDownload::Exporting(job_id) => println!("export {} started", job_id),
            SelectionDownload::Nothing => {}
        },
        Command::Remove { ids } => {
            orchestrator.remove_selection(&ids).await?;
            println!("removed {} object(s)", ids.len());
        }
    }
    Ok(())
}
