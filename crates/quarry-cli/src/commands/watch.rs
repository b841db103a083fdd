//! Watch command - re-run a search whenever the catalog changes.

use crate::app::App;
use crate::commands::query::print_text;
use crate::debounce::Debouncer;
use crate::render::summary;
use crate::watcher::CatalogWatcher;
use crossbeam_channel::RecvTimeoutError;
use quarry_core::{ChannelSourceListener, Config, SearchTerms, SourceEvent, UpdateLevel};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Run the watch command.
pub fn run(config: Config, terms: &[String]) -> anyhow::Result<()> {
    let mut app = App::new(config)?;
    let terms = SearchTerms::parse(&terms.join(" "));
    let styled = std::io::stdout().is_terminal();

    let (listener, receiver) = ChannelSourceListener::new();
    let _handle = CatalogWatcher::new(app.catalog.path())
        .spawn(Arc::new(listener))?;

    println!("Watching {}", app.catalog.path().display());
    println!("Press Ctrl+C to stop.");
    println!();
    show(&app, &terms, styled);

    let mut settle = Debouncer::new(app.config.settle());
    let mut pending = UpdateLevel::Selection;

    loop {
        // block until the next change unless a settle period is running
        let received = match settle.remaining(Instant::now()) {
            Some(timeout) => receiver.recv_timeout(timeout),
            None => receiver
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(SourceEvent::Updated(level)) => {
                pending = pending.max(level);
                settle.trigger();
            }
            Ok(event) => {
                app.library.handle_event(event, &app.catalog);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if !settle.ready(Instant::now()) {
            continue;
        }

        let level = std::mem::replace(&mut pending, UpdateLevel::Selection);
        match app.reload(SourceEvent::Updated(level)) {
            Ok(true) => {
                info!(records = app.catalog.len(), "Catalog reloaded");
                println!();
                show(&app, &terms, styled);
            }
            Ok(false) => {}
            // a half-written catalog fails to parse; the finished write
            // changes the mtime again
            Err(e) => warn!(error = %e, "Catalog reload failed, keeping previous records"),
        }
    }

    println!("Monitoring stopped.");
    Ok(())
}

fn show(app: &App, terms: &SearchTerms, styled: bool) {
    let outcome = app.library.search(terms);
    print_text(&outcome, styled);
    println!("-- {}", summary(&outcome));
}
