use tracing::{error, info, warn};

use crate::domain::{Batch, Transcript};
use crate::generators::traits::{SummaryGenerator, TranscriptGenerator};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub transcribed: usize,
    pub summarized: usize,
    pub failed: usize,
}

pub struct EnrichmentService<T: TranscriptGenerator, S: SummaryGenerator> {
    transcriber: T,
    summarizer: S,
}

impl<T: TranscriptGenerator, S: SummaryGenerator> EnrichmentService<T, S> {
    pub fn new(transcriber: T, summarizer: S) -> Self {
        Self {
            transcriber,
            summarizer,
        }
    }

    /// Attach transcripts and summaries to every episode in the batch.
    /// A failing episode is logged and left as it was; the rest carry on.
    pub fn enrich(&self, batch: &mut Batch) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        for pod in batch.iter_mut() {
            let channel = &pod.channel;

            for episode in pod.episodes.iter_mut() {
                let transcript = match self.transcriber.transcribe(channel, episode) {
                    Ok(text) => text,
                    Err(e) => {
                        error!(
                            channel = %channel.label(),
                            episode = %episode.label(),
                            error = %e,
                            "Transcript generation failed"
                        );
                        report.failed += 1;
                        continue;
                    }
                };

                let summary = self.summarizer.summarize(channel, episode, &transcript);

                if !transcript.trim().is_empty() {
                    report.transcribed += 1;
                }
                episode.attach_transcript(Transcript::new(transcript));

                match summary {
                    Ok(summary) => {
                        if episode.attach_summary(summary) {
                            report.summarized += 1;
                        } else {
                            warn!(
                                channel = %channel.label(),
                                episode = %episode.label(),
                                "Summary is missing its paragraph or bullet form, not attaching it"
                            );
                            report.failed += 1;
                        }
                    }
                    Err(e) => {
                        error!(
                            channel = %channel.label(),
                            episode = %episode.label(),
                            error = %e,
                            "Summary generation failed"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            transcribed = report.transcribed,
            summarized = report.summarized,
            failed = report.failed,
            "Enrichment finished"
        );
        report
    }
}
