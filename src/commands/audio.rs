//! Ambient music autoplay policy.
//!
//! Hosts block audible autoplay until the user interacts with the page. The
//! policy parks a blocked play request and releases it on the first
//! interaction, and handles track load errors with a linear backoff before
//! moving on to the next track. Actual playback belongs to the host.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::scene::Track;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioPolicyConfig {
    pub autoplay_on_mount: bool,
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl Default for AudioPolicyConfig {
    fn default() -> Self {
        Self {
            autoplay_on_mount: true,
            max_retries: 3,
            retry_base_ms: 1_000,
        }
    }
}

/// What the host should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCommand {
    Play { track_id: u32, url: String },
    RetryAfter { track_id: u32, delay_ms: u64 },
}

/// Result of a play attempt as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// Rejected by the autoplay policy of the host.
    Blocked,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct AutoplayPolicy {
    config: AudioPolicyConfig,
    playlist: Vec<Track>,
    current: Option<usize>,
    unlocked: bool,
    pending: Option<u32>,
    retries: HashMap<u32, u32>,
    playing: bool,
}

impl AutoplayPolicy {
    pub fn new(playlist: Vec<Track>, config: AudioPolicyConfig) -> Self {
        Self {
            config,
            playlist,
            current: None,
            unlocked: false,
            pending: None,
            retries: HashMap::new(),
            playing: false,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|index| self.playlist.get(index))
    }

    /// Called once the player is mounted.
    pub fn mount(&mut self) -> Option<AudioCommand> {
        if !self.config.autoplay_on_mount || self.playlist.is_empty() {
            return None;
        }
        self.play_index(0)
    }

    pub fn play_track(&mut self, track_id: u32) -> Option<AudioCommand> {
        let index = self.playlist.iter().position(|track| track.id == track_id)?;
        self.play_index(index)
    }

    pub fn report(&mut self, track_id: u32, outcome: PlayOutcome) -> Option<AudioCommand> {
        if self.current_track().map(|track| track.id) != Some(track_id) {
            return None;
        }

        match outcome {
            PlayOutcome::Started => {
                self.playing = true;
                self.pending = None;
                None
            }
            PlayOutcome::Blocked => {
                self.playing = false;
                if self.unlocked {
                    log::warn!("audio_play: track={} blocked after unlock", track_id);
                } else {
                    log::info!("audio_play: track={} parked until first interaction", track_id);
                    self.pending = Some(track_id);
                }
                None
            }
            PlayOutcome::Failed(reason) => {
                self.playing = false;
                self.load_error(track_id, &reason)
            }
        }
    }

    /// Click, touch or key press. Only the first one releases a parked play.
    pub fn user_interacted(&mut self) -> Option<AudioCommand> {
        if self.unlocked {
            return None;
        }
        self.unlocked = true;
        let track_id = self.pending.take()?;
        log::info!("audio_unlock: releasing parked track={}", track_id);
        self.play_track(track_id)
    }

    pub fn track_ended(&mut self) -> Option<AudioCommand> {
        self.playing = false;
        self.advance()
    }

    fn load_error(&mut self, track_id: u32, reason: &str) -> Option<AudioCommand> {
        let attempts = self.retries.entry(track_id).or_insert(0);
        if *attempts < self.config.max_retries {
            let delay_ms = self.config.retry_base_ms * (*attempts as u64 + 1);
            *attempts += 1;
            log::warn!(
                "audio_load: track={} failed ({}), retry {} in {}ms",
                track_id,
                reason,
                attempts,
                delay_ms
            );
            return Some(AudioCommand::RetryAfter { track_id, delay_ms });
        }

        log::warn!("audio_load: track={} giving up, skipping", track_id);
        self.advance()
    }

    fn advance(&mut self) -> Option<AudioCommand> {
        if self.playlist.is_empty() {
            return None;
        }
        let next = self.current.map_or(0, |index| (index + 1) % self.playlist.len());
        self.play_index(next)
    }

    fn play_index(&mut self, index: usize) -> Option<AudioCommand> {
        let track = self.playlist.get(index)?;
        self.current = Some(index);
        self.retries.insert(track.id, 0);
        Some(AudioCommand::Play {
            track_id: track.id,
            url: track.url.clone(),
        })
    }
}
