//! Progress bars for long loads, and a tracing writer that prints above them.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

const LOAD_TEMPLATE: &str =
    "{spinner:.green} {prefix:.bold} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";
const STREAM_TEMPLATE: &str = "{spinner:.green} {prefix:.bold} [{elapsed_precise}] {pos} records {msg}";

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Progress for one adapter load, measured in source records
pub struct LoadProgress {
    bar: ProgressBar,
}

impl LoadProgress {
    /// `None` gives a spinner for streams of unknown length
    pub fn new(adapter_id: &str, total: Option<u64>) -> Self {
        let bar = match total {
            Some(total) => {
                let bar = multi_progress().add(ProgressBar::new(total));
                if let Ok(style) = ProgressStyle::with_template(LOAD_TEMPLATE) {
                    bar.set_style(style.progress_chars("=>-"));
                }
                bar
            }
            None => {
                let bar = multi_progress().add(ProgressBar::new_spinner());
                if let Ok(style) = ProgressStyle::with_template(STREAM_TEMPLATE) {
                    bar.set_style(style);
                }
                bar
            }
        };
        bar.set_prefix(adapter_id.to_string());
        Self { bar }
    }

    pub fn advance(&self, records: u64, skipped: u64) {
        self.bar.inc(records);
        if skipped > 0 {
            self.bar.set_message(format!("{} skipped", skipped));
        }
    }

    /// Switch to a new phase such as a child CSV
    pub fn phase(&self, label: &str) {
        self.bar.set_position(0);
        self.bar.set_message(label.to_string());
    }

    pub fn finish(&self, summary: &str) {
        self.bar.finish_with_message(summary.to_string());
    }
}

/// Progress for image URL checks, measured in distinct URLs
pub struct CheckProgress {
    bar: ProgressBar,
}

impl CheckProgress {
    pub fn new(label: &str) -> Self {
        let bar = multi_progress().add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::with_template(LOAD_TEMPLATE) {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.set_prefix(label.to_string());
        Self { bar }
    }

    pub fn update(&self, checked: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(checked as u64);
    }

    pub fn finish(&self, summary: &str) {
        self.bar.finish_with_message(summary.to_string());
    }
}

/// Routes tracing output through the shared `MultiProgress`
#[derive(Default, Clone)]
pub struct LogWriterFactory;

pub struct LogWriter {
    pending: String,
}

fn emit(line: &str) {
    let _ = multi_progress().println(line.trim_end_matches('\r'));
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));
        while let Some(end) = self.pending.find('\n') {
            emit(&self.pending[..end]);
            self.pending.drain(..=end);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            emit(&self.pending);
            self.pending.clear();
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            pending: String::new(),
        }
    }
}
