//! Subcommand drivers.

use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use pivot::{Instant, ReplayTransport, StreamSession, Transport, WsTransport};

use crate::cli::{GenerateArgs, OutputArgs, ReplayArgs};
use crate::config::PivotConfig;
use crate::error::{CliError, Result};
use crate::render::{OutputFormat, sink_for, summarize};

/// Upper bound on how long the driver sleeps between polls.
const IDLE_POLL: Duration = Duration::from_millis(10);

pub fn run_generate(args: &GenerateArgs, mut config: PivotConfig, out: impl Write) -> Result<()> {
    if let Some(url) = &args.url {
        config.connection.url.clone_from(url);
    }
    let max_depth = args.max_depth.unwrap_or(config.generation.max_depth);
    let transport = WsTransport::new(config.transport_config());
    let mut session = StreamSession::with_config(transport, config.session_config());

    session.connect()?;
    session.submit(&args.prompt, max_depth)?;
    let timeout = args.timeout_secs.map(Duration::from_secs);
    drive(&mut session, args.output, timeout, out)
}

pub fn run_replay(args: &ReplayArgs, config: &PivotConfig, out: impl Write) -> Result<()> {
    let transport = ReplayTransport::new(read_script(&args.file)?).close_when_exhausted();
    let max_depth = args.max_depth.unwrap_or(config.generation.max_depth);
    let mut session = StreamSession::with_config(transport, config.session_config());

    session.connect()?;
    session.submit(&args.prompt, max_depth)?;
    drive(&mut session, args.output, None, out)
}

/// Read a JSONL script, skipping blank lines. A script with no messages is
/// an invalid argument.
pub fn read_script(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let messages: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if messages.is_empty() {
        return Err(CliError::invalid(format!(
            "replay script {} has no messages",
            path.display()
        )));
    }
    Ok(messages)
}

/// Poll `session` until the request finishes, rendering to `out`.
///
/// With `watch`, every changed commit is rendered as it happens and the
/// newest-node cue is shown only while the request is still loading; a frame
/// left showing the cue is re-rendered without it once loading ends.
/// Otherwise the final model is rendered once. A request that ended in an
/// error still renders what arrived before returning the error.
fn drive<T: Transport, W: Write>(
    session: &mut StreamSession<T>,
    output: OutputArgs,
    timeout: Option<Duration>,
    mut out: W,
) -> Result<()> {
    let mut cue_on_screen = false;
    let started = Instant::now();
    loop {
        let now = Instant::now();
        if let Some(commit) = session.poll(now) {
            tracing::debug!(
                added = commit.diff.added.len(),
                changed = commit.diff.changed.len(),
                unchanged = commit.is_unchanged(),
                "layout committed"
            );
            if let Some(newest) = session.newest().and_then(|id| session.node(id.as_str())) {
                tracing::info!(id = %newest.id, node = %summarize(newest.content()), "newest node");
            }
            if output.watch && !commit.is_unchanged() {
                let show_cue = session.is_loading();
                sink_for(output.format, &mut out, show_cue)
                    .render(session.nodes(), session.edges())?;
                cue_on_screen = show_cue
                    && output.format == OutputFormat::Text
                    && session.newest().is_some();
            }
        }
        if !session.is_loading() && !session.has_pending() {
            break;
        }
        if let Some(limit) = timeout {
            if now.duration_since(started) >= limit {
                session.close();
                return Err(CliError::Timeout {
                    seconds: limit.as_secs(),
                });
            }
        }
        let pause = session
            .next_deadline()
            .map_or(IDLE_POLL, |deadline| deadline.saturating_duration_since(now))
            .min(IDLE_POLL);
        thread::sleep(pause);
    }

    if !output.watch || cue_on_screen {
        sink_for(output.format, &mut out, false).render(session.nodes(), session.edges())?;
    }

    let stats = session.stats();
    tracing::info!(
        messages = stats.messages_received,
        decode_errors = stats.decode_errors,
        updates = stats.updates_applied,
        layout_passes = stats.layout_passes,
        commits_kept = stats.commits_kept,
        commits_replaced = stats.commits_replaced,
        cache_hit_rate = stats.cache.hit_rate,
        "session finished"
    );

    match session.error() {
        Some(err) => Err(CliError::Session(err.clone())),
        None => Ok(()),
    }
}
