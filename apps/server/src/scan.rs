//! # Scan Station
//!
//! Terminal front end for a USB keyboard-wedge scanner: every scanned line
//! goes through a capture session and is looked up in the store.
//!
//! ```text
//! stdin line ──► wedge channel ──► CaptureController ──► on_scan(code)
//!                                                            │
//!                         ┌──────────────────────────────────┘
//!                         ▼
//!              get_by_barcode(code)
//!                 ├── Some(product) → print stock line
//!                 └── None          → print a new-product draft
//! ```
//!
//! After each accepted scan the session is rearmed for the next one.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use stockroom_capture::{
    wedge_channel, CaptureController, CaptureHandle, CaptureObserver, CaptureSettings,
    CaptureState,
};
use stockroom_core::{Money, Product, ProductDraft, StockStatus};
use stockroom_db::{Database, DbResult};

const WEDGE_BUFFER: usize = 16;

/// What a scanned code resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Found(Product),
    /// Unknown code: a form draft with the barcode filled in.
    NotFound(ProductDraft),
}

/// Forwards accepted scans out of the controller task.
struct ScanForwarder {
    scans: mpsc::UnboundedSender<String>,
}

impl CaptureObserver for ScanForwarder {
    fn on_state(&self, state: &CaptureState) {
        debug!(%state, "Capture state");
    }

    fn on_scan(&self, text: &str) {
        if self.scans.send(text.to_string()).is_err() {
            debug!(code = %text, "Scan station gone; scan dropped");
        }
    }
}

/// Resolves a scanned code against the store.
pub async fn lookup(db: &Database, code: &str) -> DbResult<ScanOutcome> {
    if let Some(product) = db.products().get_by_barcode(code).await? {
        return Ok(ScanOutcome::Found(product));
    }

    let mut draft = ProductDraft::new("", Money::zero());
    draft.apply_scanned_barcode(code)?;
    Ok(ScanOutcome::NotFound(draft))
}

fn describe(outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::Found(p) => format!(
            "{} | {} | stock {} ({})",
            p.name,
            p.price,
            p.stock,
            StockStatus::of(p).label()
        ),
        ScanOutcome::NotFound(draft) => format!(
            "Not in catalog: {}. New product draft ready.",
            draft.barcode.as_deref().unwrap_or_default()
        ),
    }
}

/// A running wedge capture session.
pub struct ScanStation {
    lines: mpsc::Sender<String>,
    scans: mpsc::UnboundedReceiver<String>,
    handle: CaptureHandle,
}

impl ScanStation {
    /// Spawns the controller and starts scanning.
    pub async fn start(settings: CaptureSettings) -> anyhow::Result<Self> {
        let (lines, factory) = wedge_channel(WEDGE_BUFFER);
        let (scans_tx, scans) = mpsc::unbounded_channel();

        let handle = CaptureController::spawn(
            settings,
            Arc::new(factory),
            Arc::new(ScanForwarder { scans: scans_tx }),
        );

        let state = handle.start().await?;
        if let CaptureState::Error(e) = state {
            anyhow::bail!("Scanner failed to start: {}", e.user_message());
        }

        Ok(ScanStation {
            lines,
            scans,
            handle,
        })
    }

    /// Feeds one line of wedge input.
    pub async fn feed(&self, line: String) -> anyhow::Result<()> {
        self.lines
            .send(line)
            .await
            .map_err(|_| anyhow::anyhow!("Scanner input closed"))
    }

    /// Waits for the next accepted scan. Cancel-safe.
    pub async fn next_scan(&mut self) -> Option<String> {
        self.scans.recv().await
    }

    /// Restarts scanning after a scan or a failure.
    pub async fn rearm(&self) -> anyhow::Result<()> {
        if let CaptureState::Error(e) = self.handle.start().await? {
            debug!(error = %e, "Restart failed, retrying");
            self.handle.retry().await?;
        }
        Ok(())
    }

    pub async fn shutdown(self) {
        if let Err(e) = self.handle.shutdown().await {
            debug!(error = %e, "Capture controller already stopped");
        }
    }
}

/// Runs the interactive station until stdin closes or `q` is entered.
pub async fn run(db: Database, settings: CaptureSettings) -> anyhow::Result<()> {
    let mut station = ScanStation::start(settings).await?;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    info!("Scan station ready; scan a barcode or type q to quit");
    println!("Ready. Scan a barcode (q to quit).");

    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
                    break;
                }
                station.feed(line.to_string()).await?;
            }
            Some(code) = station.next_scan() => {
                if let Err(e) = station.rearm().await {
                    warn!(error = %e, "Could not restart scanning");
                }
                match lookup(&db, &code).await {
                    Ok(outcome) => println!("{}", describe(&outcome)),
                    Err(e) => warn!(error = %e, code = %code, "Lookup failed"),
                }
            }
        }
    }

    station.shutdown().await;
    info!("Scan station stopped");
    Ok(())
}
