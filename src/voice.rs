//! Spoken guidance.
//!
//! High-priority announcements interrupt whatever is being spoken and
//! drop anything still waiting; low-priority ones queue behind it.

use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    pub priority: Priority,
    pub lang: &'static str,
    pub rate: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, priority: Priority) -> Self {
        Utterance {
            text: text.into(),
            priority,
            lang: "en-US",
            rate: 1.0,
        }
    }
}

/// Receiver of narration requests.
pub trait Narrator {
    fn speak(&mut self, text: &str, priority: Priority);
    fn cancel(&mut self);
}

/// In-memory narration queue. The platform speech engine pulls from it
/// with [`VoiceQueue::start_next`] and reports completion with
/// [`VoiceQueue::finish`].
#[derive(Debug, Default)]
pub struct VoiceQueue {
    speaking: Option<Utterance>,
    pending: VecDeque<Utterance>,
    interrupted: usize,
}

impl VoiceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.is_some()
    }

    pub fn speaking(&self) -> Option<&Utterance> {
        self.speaking.as_ref()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Utterance> {
        self.pending.iter()
    }

    /// Number of utterances cut short by a high-priority request.
    pub fn interrupted(&self) -> usize {
        self.interrupted
    }

    /// Promote the next pending utterance if nothing is playing.
    pub fn start_next(&mut self) -> Option<&Utterance> {
        if self.speaking.is_none() {
            self.speaking = self.pending.pop_front();
        }
        self.speaking.as_ref()
    }

    pub fn finish(&mut self) {
        self.speaking = None;
    }

    /// Take everything not yet handed to the speech engine, for
    /// platforms that run their own playback queue.
    pub fn drain(&mut self) -> Vec<Utterance> {
        self.pending.drain(..).collect()
    }
}

impl Narrator for VoiceQueue {
    fn speak(&mut self, text: &str, priority: Priority) {
        if priority == Priority::High {
            self.cancel();
        }
        self.pending.push_back(Utterance::new(text, priority));
    }

    fn cancel(&mut self) {
        if self.speaking.take().is_some() {
            self.interrupted += 1;
        }
        self.pending.clear();
    }
}
