//! Timed subtitle track played during the cinematic message.

use crate::models::scene::SubtitleCue;

/// Result of advancing the track by one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleUpdate {
    Unchanged,
    /// The visible line changed; `None` clears the caption.
    Changed(Option<String>),
    /// Last cue ended. Reported once.
    Finished,
}

#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    cues: Vec<SubtitleCue>,
    elapsed_ms: u64,
    current: Option<usize>,
    running: bool,
    finished: bool,
}

impl SubtitleTrack {
    pub fn new(mut cues: Vec<SubtitleCue>) -> Self {
        cues.retain(|cue| cue.end_ms > cue.start_ms);
        cues.sort_by_key(|cue| cue.start_ms);
        Self {
            cues,
            elapsed_ms: 0,
            current: None,
            running: false,
            finished: false,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.cues.iter().map(|cue| cue.end_ms).max().unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.elapsed_ms = 0;
        self.current = None;
        self.running = true;
        self.finished = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.current = None;
    }

    pub fn cue_at(&self, elapsed_ms: u64) -> Option<&SubtitleCue> {
        self.cues
            .iter()
            .find(|cue| elapsed_ms >= cue.start_ms && elapsed_ms < cue.end_ms)
    }

    pub fn current_text(&self) -> Option<&str> {
        self.current
            .and_then(|index| self.cues.get(index))
            .map(|cue| cue.text.as_str())
    }

    pub fn advance(&mut self, dt_ms: u64) -> SubtitleUpdate {
        if !self.running {
            return SubtitleUpdate::Unchanged;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);

        if self.elapsed_ms >= self.duration_ms() {
            self.running = false;
            self.current = None;
            if self.finished {
                return SubtitleUpdate::Unchanged;
            }
            self.finished = true;
            return SubtitleUpdate::Finished;
        }

        let elapsed = self.elapsed_ms;
        let next = self
            .cues
            .iter()
            .position(|cue| elapsed >= cue.start_ms && elapsed < cue.end_ms);
        if next == self.current {
            return SubtitleUpdate::Unchanged;
        }
        self.current = next;
        SubtitleUpdate::Changed(self.current_text().map(str::to_string))
    }
}

/// Built-in greeting shown before the cinematic loop.
pub fn default_cues() -> Vec<SubtitleCue> {
    [
        (0, 3_000, "Merry Christmas"),
        (3_500, 7_000, "May the lights find you wherever you are"),
        (7_500, 11_000, "and every memory here shine a little brighter"),
        (11_500, 14_500, "Happy holidays"),
    ]
    .into_iter()
    .map(|(start_ms, end_ms, text)| SubtitleCue {
        start_ms,
        end_ms,
        text: text.to_string(),
    })
    .collect()
}
