use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use serde::Serialize;
use tracing::debug;

use crate::domain::{Channel, Episode, Summary};
use crate::errors::{IngestError, IngestResult};
use crate::generators::traits::{SummaryGenerator, TranscriptGenerator};

/// What an external generator receives on stdin
#[derive(Debug, Serialize)]
struct GeneratorInput<'a> {
    channel_title: Option<&'a str>,
    rss_url: &'a str,
    episode_title: Option<&'a str>,
    episode_id: Option<&'a str>,
    audio_url: Option<&'a str>,
    links: Vec<&'a str>,
    summary: Option<&'a str>,
    transcript: Option<&'a str>,
}

impl<'a> GeneratorInput<'a> {
    fn new(channel: &'a Channel, episode: &'a Episode, transcript: Option<&'a str>) -> Self {
        let audio_url = episode
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("enclosure"))
            .map(|l| l.href.as_str());

        Self {
            channel_title: channel.title.as_deref(),
            rss_url: &channel.rss_url,
            episode_title: episode.title.as_deref(),
            episode_id: episode.source_id.as_deref(),
            audio_url,
            links: episode.links.iter().map(|l| l.href.as_str()).collect(),
            summary: episode.summary.as_deref(),
            transcript,
        }
    }
}

/// Runs an external program per episode: JSON in on stdin, result on stdout
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    /// Split a command line on whitespace into program and arguments.
    ///
    /// No shell quoting is understood: quotes are kept as literal characters and
    /// a path containing spaces cannot be expressed. Point the variable at a
    /// wrapper script for anything more involved.
    pub fn parse(command_line: &str) -> IngestResult<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| IngestError::Config("generator command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    fn run(&self, input: &GeneratorInput<'_>) -> IngestResult<String> {
        let payload = serde_json::to_vec(input)?;

        debug!(program = %self.program, "Running generator");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| IngestError::Enrichment(format!("failed to start {}: {}", self.program, e)))?;

        // Written from its own thread: a child that fills stdout before draining stdin would deadlock
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || match stdin.write_all(&payload) {
                // Generators that ignore their input may exit before reading it
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            })
        });

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| IngestError::Enrichment(format!("stdin writer for {} panicked", self.program)))??;
        }
        if !output.status.success() {
            return Err(IngestError::Enrichment(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| IngestError::Enrichment(format!("{} wrote invalid UTF-8: {}", self.program, e)))
    }
}

impl TranscriptGenerator for CommandGenerator {
    fn transcribe(&self, channel: &Channel, episode: &Episode) -> IngestResult<String> {
        let text = self.run(&GeneratorInput::new(channel, episode, None))?;
        Ok(text.trim().to_string())
    }
}

impl SummaryGenerator for CommandGenerator {
    fn summarize(
        &self,
        channel: &Channel,
        episode: &Episode,
        transcript: &str,
    ) -> IngestResult<Summary> {
        let output = self.run(&GeneratorInput::new(channel, episode, Some(transcript)))?;
        serde_json::from_str(output.trim())
            .map_err(|e| IngestError::Enrichment(format!("summary output is not valid JSON: {}", e)))
    }
}
