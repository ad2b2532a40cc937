//! Speech-to-text input.
//!
//! Recognition itself happens in an external program. This module only turns
//! its output into [`DictationEvent`]s pushed over a channel; the editor
//! session decides what to do with them.

use log::{error, info, warn};
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread;
use thiserror::Error;

use crate::config::DictationConfig;

const INTERIM_PREFIX: &str = "partial:";
const FINAL_PREFIX: &str = "final:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationEvent {
    /// A finished segment; gets appended to the note.
    Final(String),
    /// Work-in-progress text, only displayed.
    Interim(String),
    Error(String),
    /// The recognizer closed the session on its own.
    Ended,
}

#[derive(Debug, Error)]
pub enum DictationError {
    #[error("Voice typing is not available (no dictation command configured)")]
    Unsupported,
    #[error("Failed to start dictation: {0}")]
    StartFailed(String),
}

pub trait SpeechRecognizer {
    /// Begin a session; events flow into `events` until stopped or ended.
    fn start(&mut self, events: Sender<DictationEvent>) -> Result<(), DictationError>;
    fn stop(&mut self);
}

/// The configured recognizer, or `None` when dictation is unavailable.
pub fn recognizer_from_config(config: &DictationConfig) -> Option<Box<dyn SpeechRecognizer>> {
    config
        .command
        .as_ref()
        .filter(|c| !c.trim().is_empty())
        .map(|command| Box::new(CommandRecognizer::new(command.clone(), config.args.clone())) as Box<dyn SpeechRecognizer>)
}

/// Interpret one line of recognizer output.
pub fn parse_transcript_line(line: &str) -> Option<DictationEvent> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(INTERIM_PREFIX) {
        let text = rest.trim();
        return (!text.is_empty()).then(|| DictationEvent::Interim(text.to_string()));
    }
    let text = line.strip_prefix(FINAL_PREFIX).unwrap_or(line).trim();
    (!text.is_empty()).then(|| DictationEvent::Final(text.to_string()))
}

/// Runs an external speech-to-text command and reads transcripts from its stdout.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandRecognizer {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            child: None,
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&mut self, events: Sender<DictationEvent>) -> Result<(), DictationError> {
        self.stop();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                error!("event=dictation_start module=dictation status=error program={} error={}", self.program, e);
                DictationError::StartFailed(e.to_string())
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DictationError::StartFailed("recognizer stdout unavailable".to_string()))?;

        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let event = match line {
                    Ok(line) => match parse_transcript_line(&line) {
                        Some(event) => event,
                        None => continue,
                    },
                    Err(e) => {
                        let _ = events.send(DictationEvent::Error(e.to_string()));
                        return;
                    }
                };
                // Receiver gone means the session was stopped.
                if events.send(event).is_err() {
                    return;
                }
            }
            let _ = events.send(DictationEvent::Ended);
        });

        info!("event=dictation_start module=dictation status=ok program={}", self.program);
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!("event=dictation_stop module=dictation status=error error={}", e);
            }
            let _ = child.wait();
            info!("event=dictation_stop module=dictation status=ok");
        }
    }
}

impl Drop for CommandRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_map_to_final_and_interim_events() {
        assert_eq!(parse_transcript_line("hello there"), Some(DictationEvent::Final("hello there".into())));
        assert_eq!(parse_transcript_line("final: done"), Some(DictationEvent::Final("done".into())));
        assert_eq!(parse_transcript_line("partial: hel"), Some(DictationEvent::Interim("hel".into())));
        assert_eq!(parse_transcript_line("   "), None);
        assert_eq!(parse_transcript_line("partial:"), None);
    }

    #[test]
    fn no_command_means_unavailable() {
        assert!(recognizer_from_config(&DictationConfig::default()).is_none());

        let config = DictationConfig {
            command: Some("  ".to_string()),
            args: Vec::new(),
        };
        assert!(recognizer_from_config(&config).is_none());
    }

    #[test]
    fn missing_program_fails_to_start() {
        let (tx, _rx) = std::sync::mpsc::channel();
        let mut recognizer = CommandRecognizer::new("/nonexistent/notepin-recognizer".into(), Vec::new());
        assert!(matches!(recognizer.start(tx), Err(DictationError::StartFailed(_))));
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_streamed_then_ended() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut recognizer = CommandRecognizer::new(
            "sh".into(),
            vec!["-c".into(), "echo 'partial: hel'; echo 'hello world'".into()],
        );
        recognizer.start(tx).unwrap();

        let events: Vec<DictationEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                DictationEvent::Interim("hel".into()),
                DictationEvent::Final("hello world".into()),
                DictationEvent::Ended,
            ]
        );
    }
}
