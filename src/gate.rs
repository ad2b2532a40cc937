//! PIN prompt used to open locked notes and to set the master PIN.

use log::{info, warn};

use crate::store::{PinStore, StoreError};

pub const MIN_PIN_LEN: usize = 4;
pub const MAX_PIN_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinPromptMode {
    /// Store whatever is entered as the new master PIN.
    Set,
    /// Compare against the stored PIN before opening `note_id`.
    Unlock { note_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Prompt stays open (validation error or wrong PIN).
    Pending,
    PinSaved,
    Unlocked(String),
}

#[derive(Debug, Clone)]
pub struct PinPrompt {
    pub mode: PinPromptMode,
    input: String,
    error: Option<String>,
}

impl PinPrompt {
    pub fn set_pin() -> Self {
        Self::with_mode(PinPromptMode::Set)
    }

    pub fn unlock(note_id: String) -> Self {
        Self::with_mode(PinPromptMode::Unlock { note_id })
    }

    fn with_mode(mode: PinPromptMode) -> Self {
        Self {
            mode,
            input: String::new(),
            error: None,
        }
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Digits only, at most six. Typing clears the error.
    pub fn push(&mut self, ch: char) {
        if ch.is_ascii_digit() && self.input.len() < MAX_PIN_LEN {
            self.input.push(ch);
            self.error = None;
        }
    }

    pub fn pop(&mut self) {
        self.input.pop();
        self.error = None;
    }

    pub fn submit(&mut self, pins: &PinStore<'_>) -> Result<PromptOutcome, StoreError> {
        if self.input.len() < MIN_PIN_LEN {
            self.error = Some(format!("PIN must be at least {} digits", MIN_PIN_LEN));
            return Ok(PromptOutcome::Pending);
        }

        match &self.mode {
            PinPromptMode::Set => {
                pins.set(&self.input)?;
                self.input.clear();
                Ok(PromptOutcome::PinSaved)
            }
            PinPromptMode::Unlock { note_id } => {
                if pins.get().as_deref() == Some(self.input.as_str()) {
                    info!("event=note_unlock module=gate status=ok");
                    Ok(PromptOutcome::Unlocked(note_id.clone()))
                } else {
                    warn!("event=note_unlock module=gate status=denied");
                    self.input.clear();
                    self.error = Some("Incorrect PIN".to_string());
                    Ok(PromptOutcome::Pending)
                }
            }
        }
    }
}
