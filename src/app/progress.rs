use std::io::{IsTerminal, Write};
use std::time::Duration;

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tracing::info;

use crate::metrics::RunProgress;

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 30;

/// Live statistics output. Redraws one colored line on a terminal, logs at
/// `info` otherwise.
pub(super) struct ProgressReporter {
    goal: Duration,
    no_color: bool,
    interactive: bool,
}

impl ProgressReporter {
    pub(super) fn new(goal: Duration, no_color: bool) -> Self {
        Self {
            goal,
            no_color,
            interactive: std::io::stderr().is_terminal(),
        }
    }

    pub(super) fn report(&self, stats: &RunProgress) {
        if !self.interactive {
            info!(
                "Progress: {} requests ({} ok, {} failed), {:.1} req/s.",
                stats.total_requests,
                stats.successful_requests,
                stats.failed_requests,
                stats.requests_per_sec()
            );
            return;
        }
        if render_progress_line(&build_progress_line(stats, self.goal), self.no_color).is_err() {
            info!("Progress line could not be written to stderr.");
        }
    }

    /// Draws the final state and moves past the progress line.
    pub(super) fn finish(&self, stats: &RunProgress) {
        if !self.interactive {
            return;
        }
        let segments = build_progress_line(stats, self.goal);
        if render_progress_line(&segments, self.no_color).is_err() {
            return;
        }
        let mut out = std::io::stderr();
        drop(out.write_all(b"\n").and_then(|()| out.flush()));
    }
}

fn render_progress_line(line: &[ProgressSegment], no_color: bool) -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for segment in line {
        match segment.color {
            Some(color) if !no_color => {
                queue!(
                    out,
                    SetForegroundColor(color),
                    Print(&segment.text),
                    ResetColor
                )?;
            }
            Some(_) | None => queue!(out, Print(&segment.text))?,
        }
    }
    out.flush()?;
    Ok(())
}

fn build_progress_line(stats: &RunProgress, goal: Duration) -> Vec<ProgressSegment> {
    let elapsed = stats.elapsed();
    let goal_ms = goal.as_millis().max(1);
    let elapsed_ms = elapsed.as_millis().min(goal_ms);
    let width = u128::try_from(BAR_WIDTH).unwrap_or(u128::MAX);
    let filled = elapsed_ms
        .saturating_mul(width)
        .checked_div(goal_ms)
        .unwrap_or(0);
    let filled = usize::try_from(filled).unwrap_or(BAR_WIDTH).min(BAR_WIDTH);

    let bar = format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH.saturating_sub(filled))
    );
    let time_text = format!(
        " {:.1}s / {}s",
        elapsed.as_secs_f64(),
        goal.as_secs()
    );
    let counts_text = format!(
        " | {} total, {} ok",
        stats.total_requests, stats.successful_requests
    );
    let failed_text = format!(", {} failed", stats.failed_requests);
    let rate_text = format!(" | {:.1} req/s", stats.requests_per_sec());

    let failed_color = if stats.failed_requests > 0 {
        Color::Red
    } else {
        Color::Green
    };

    vec![
        ProgressSegment::plain(bar),
        ProgressSegment::colored(time_text, Color::Yellow),
        ProgressSegment::plain(counts_text),
        ProgressSegment::colored(failed_text, failed_color),
        ProgressSegment::colored(rate_text, Color::Cyan),
    ]
}

struct ProgressSegment {
    text: String,
    color: Option<Color>,
}

impl ProgressSegment {
    const fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    const fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}
