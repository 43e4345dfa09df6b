use super::ui;
use crate::core::config::AppConfig;
use crate::core::rates::RateProvider;
use crate::dashboard::{Dashboard, DashboardView, Renderer};
use anyhow::Result;
use console::Term;
use std::future::Future;
use std::io::{self, BufRead};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

const HELP: &str = "Commands: from <CODE> | to <CODE> | amount <N> | swap | refresh | quit";

/// Redraws the whole screen on every frame.
pub struct TerminalRenderer {
    term: Term,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<()> {
        self.term.clear_screen()?;
        let mut frame = vec![
            ui::converter_panel(view.converter),
            String::new(),
            ui::ticker_panel(view.ticker, view.ticker_target, view.ticker_bases),
            String::new(),
            ui::style_text(HELP, ui::StyleType::Subtle),
        ];
        if let Some(notice) = view.notice {
            frame.push(ui::style_text(notice, ui::StyleType::Error));
        }
        self.term.write_line(&frame.join("\n"))?;
        Ok(())
    }
}

/// Forwards stdin lines to the dashboard until EOF or the dashboard hangs up.
///
/// Runs on a plain thread so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader(tx: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to read from stdin");
                    break;
                }
            }
        }
        debug!("stdin reader stopped");
    });
}

pub async fn run(provider: Arc<dyn RateProvider>, config: &AppConfig) -> Result<()> {
    let mut dashboard = Dashboard::from_config(provider, config)?;
    let (tx, rx) = mpsc::channel(16);
    spawn_stdin_reader(tx);

    let mut renderer = TerminalRenderer::new();
    dashboard
        .run(rx, &mut renderer, shutdown_on(tokio::signal::ctrl_c()))
        .await
}

/// Resolves when `signal` fires. If the signal cannot be listened for, never
/// resolves, leaving `quit` or EOF to stop the dashboard.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
