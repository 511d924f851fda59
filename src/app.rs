use std::io::Write;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::api::MediaSource;
use crate::application::{
    create_next_folder, estimate_bytes, filter_trivial, plan, DownloadCoordinator,
};
use crate::domain::{DownloadPlan, FetchError, FetchReport, MediaDescriptor};
use crate::ui::{ConsoleView, InputSource};

fn is_quit(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "q" | "quit")
}

/// The prompt loop: ask for a source, report what it holds, ask how many
/// files to take, fetch them into a fresh numbered folder, repeat.
pub struct Session<S, I, W: Write> {
    coordinator: DownloadCoordinator<S>,
    input: I,
    view: ConsoleView<W>,
    output_root: PathBuf,
    min_bytes: u64,
}

impl<S, I, W> Session<S, I, W>
where
    S: MediaSource,
    I: InputSource,
    W: Write,
{
    pub fn new(
        coordinator: DownloadCoordinator<S>,
        input: I,
        view: ConsoleView<W>,
        output_root: PathBuf,
        min_bytes: u64,
    ) -> Self {
        Self {
            coordinator,
            input,
            view,
            output_root,
            min_bytes,
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> &ConsoleView<W> {
        &self.view
    }

    /// Run until the user quits or input runs out.
    ///
    /// Only a destination failure ends the session early; every other error
    /// is shown and the loop asks for the next source.
    pub async fn run(&mut self) -> Result<Vec<FetchReport>, FetchError> {
        let mut reports = Vec::new();

        loop {
            self.view.prompt_source();
            let Some(line) = self.next_line().await else {
                break;
            };
            let target = line.trim();
            if target.is_empty() {
                continue;
            }
            if is_quit(target) {
                break;
            }

            match self.handle_target(target).await {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(e @ FetchError::Destination(_)) => {
                    self.view.error(&e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{}: {}", target, e);
                    self.view.error(&e);
                }
            }
        }

        self.view.goodbye();
        Ok(reports)
    }

    async fn next_line(&mut self) -> Option<String> {
        match self.input.next_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                None
            }
        }
    }

    async fn handle_target(&mut self, target: &str) -> Result<Option<FetchReport>, FetchError> {
        let candidates = self.coordinator.enumerate(target).await?;
        let media = filter_trivial(&candidates, self.min_bytes);
        info!(
            "Kept {} of {} items at or above {} bytes",
            media.len(),
            candidates.len(),
            self.min_bytes
        );

        let estimated_bytes = estimate_bytes(&media);
        self.view
            .source_report(media.len(), estimated_bytes, candidates.len() - media.len());

        if media.is_empty() {
            self.view.no_media();
            return Ok(None);
        }

        let Some(plan) = self.ask_count(&media).await else {
            return Ok(None);
        };

        let (folder, _) = create_next_folder(&self.output_root).await?;
        self.view.download_started(&plan, &folder);

        let report = self
            .coordinator
            .fetch_all(&plan, &media, &folder, &mut self.view)
            .await;
        self.view.summary(&report);

        Ok(Some(report))
    }

    /// Keep asking until the answer fits the available items.
    async fn ask_count(&mut self, media: &[MediaDescriptor]) -> Option<DownloadPlan> {
        loop {
            self.view.prompt_count(media.len());
            let line = self.next_line().await?;
            let answer = line.trim();

            if is_quit(answer) {
                self.view.skipped();
                return None;
            }
            let Ok(requested) = answer.parse::<usize>() else {
                self.view.invalid_input(answer);
                continue;
            };

            match plan(media, requested) {
                Ok(plan) => return Some(plan),
                Err(e) => self.view.error(&e),
            }
        }
    }
}
