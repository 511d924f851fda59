pub mod input;

use std::io::Write;
use std::path::Path;

use crate::{
    application::ProgressSink,
    domain::{DownloadEvent, DownloadPlan, FetchError, FetchReport},
    utils::format_size,
};

pub use input::{InputSource, ScriptedInput, StdinInput};

/// Console rendering for the interactive session.
pub struct ConsoleView<W: Write> {
    out: W,
    current_file: String,
    /// Last progress step printed for the current item, in tenths.
    last_step: Option<(usize, u64)>,
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            current_file: String::new(),
            last_step: None,
        }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn line(&mut self, text: &str) {
        writeln!(self.out, "{}", text).ok();
        self.out.flush().ok();
    }

    pub fn prompt_source(&mut self) {
        write!(self.out, "\nEnter source URL (or 'q' to quit): ").ok();
        self.out.flush().ok();
    }

    pub fn prompt_count(&mut self, available: usize) {
        write!(
            self.out,
            "How many files to download (1-{}, 'q' to skip): ",
            available
        )
        .ok();
        self.out.flush().ok();
    }

    pub fn source_report(&mut self, count: usize, estimated_bytes: u64, trivial: usize) {
        self.line(&format!("Total media files found: {}", count));
        self.line(&format!("Estimated total size: {}", format_size(estimated_bytes)));
        if trivial > 0 {
            self.line(&format!("Skipped {} small or unsupported items", trivial));
        }
    }

    pub fn no_media(&mut self) {
        self.line("No media found.");
    }

    pub fn invalid_input(&mut self, input: &str) {
        self.line(&format!("'{}' is not a number. Try again.", input));
    }

    pub fn skipped(&mut self) {
        self.line("Skipped.");
    }

    pub fn error(&mut self, error: &FetchError) {
        self.line(&format!("Error: {}", error));
    }

    pub fn download_started(&mut self, plan: &DownloadPlan, folder: &Path) {
        self.line(&format!(
            "Downloading {} of {} files (~{} of ~{}) into {}",
            plan.requested_count,
            plan.total_count,
            format_size(plan.requested_bytes),
            format_size(plan.estimated_total_bytes),
            folder.display()
        ));
    }

    pub fn summary(&mut self, report: &FetchReport) {
        self.line(&format!(
            "Done: {} saved, {} failed, {} written to {}",
            report.saved.len(),
            report.failed.len(),
            format_size(report.bytes_written),
            report.destination.display()
        ));
        if !report.failed.is_empty() {
            let failed = report
                .failed
                .iter()
                .map(|item| format!("{} ({})", item.position, item.reason))
                .collect::<Vec<_>>()
                .join(", ");
            self.line(&format!("Failed items: {}", failed));
        }
    }

    pub fn goodbye(&mut self) {
        self.line("Bye.");
    }
}

impl<W: Write> ProgressSink for ConsoleView<W> {
    fn report(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Started { file_name, .. } => {
                self.current_file = file_name;
                self.last_step = None;
            }
            DownloadEvent::Progress {
                position,
                total,
                downloaded,
                expected: Some(expected),
            } if expected > 0 => {
                let step = (downloaded.min(expected) * 10) / expected;
                if self.last_step != Some((position, step)) {
                    self.last_step = Some((position, step));
                    write!(
                        self.out,
                        "\r[{}/{}] {} {:>3}% {}",
                        position,
                        total,
                        self.current_file,
                        step * 10,
                        format_size(downloaded)
                    )
                    .ok();
                    self.out.flush().ok();
                }
            }
            DownloadEvent::Progress { .. } => {}
            DownloadEvent::Completed {
                position,
                total,
                path,
                bytes,
            } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.line(&format!(
                    "\r[{}/{}] Downloaded: {} ({})",
                    position,
                    total,
                    name,
                    format_size(bytes)
                ));
            }
            DownloadEvent::Failed {
                position,
                total,
                error,
            } => {
                self.line(&format!("\r[{}/{}] {}", position, total, error));
            }
        }
    }
}
