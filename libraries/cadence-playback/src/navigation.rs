//! Playlist views and next/prev navigation
//!
//! Two views of the same tracks exist: the canonical (author) order and a
//! shuffled order derived from it. The `shuffle` flag selects the active view,
//! and the current index always addresses the active view.

use crate::error::{PlaybackError, Result};
use crate::shuffle::reshuffle_with;
use crate::types::{Direction, NavigationMode, Track, TrackId};
use rand::{thread_rng, Rng};
use std::collections::HashSet;

/// Canonical, author-ordered track list
///
/// Never empty, ids are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }

        let mut seen = HashSet::with_capacity(tracks.len());
        for track in &tracks {
            if !seen.insert(&track.id) {
                return Err(PlaybackError::DuplicateTrack(track.id.clone()));
            }
        }

        Ok(Self { tracks })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Always false; kept for the `len` convention
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn position(&self, id: &TrackId) -> Option<usize> {
        position_of(&self.tracks, id)
    }
}

fn position_of(tracks: &[Track], id: &TrackId) -> Option<usize> {
    tracks.iter().position(|track| &track.id == id)
}

/// Index reached from `index` in a view of `len` tracks
///
/// `len` must be non-zero.
pub fn step_index(index: usize, len: usize, direction: Direction, mode: NavigationMode) -> usize {
    let back = (index + len - 1) % len;
    match (mode, direction) {
        (NavigationMode::Reference, _) | (NavigationMode::Directional, Direction::Backward) => back,
        (NavigationMode::Directional, Direction::Forward) => (index + 1) % len,
    }
}

/// Navigation state over the canonical and shuffled views
#[derive(Debug, Clone)]
pub struct Navigator {
    canonical: Playlist,
    shuffled: Vec<Track>,
    shuffle: bool,
    current_index: usize,
    mode: NavigationMode,
}

impl Navigator {
    /// Start at the first canonical track, shuffle off
    pub fn new(playlist: Playlist, mode: NavigationMode) -> Self {
        let shuffled = playlist.tracks.clone();
        Self {
            canonical: playlist,
            shuffled,
            shuffle: false,
            current_index: 0,
            mode,
        }
    }

    /// Tracks of the view selected by the shuffle flag
    pub fn active(&self) -> &[Track] {
        if self.shuffle {
            &self.shuffled
        } else {
            self.canonical.tracks()
        }
    }

    pub fn canonical(&self) -> &Playlist {
        &self.canonical
    }

    pub fn shuffled(&self) -> &[Track] {
        &self.shuffled
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &Track {
        &self.active()[self.current_index]
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    /// Switch views without changing the current track
    ///
    /// Enabling shuffle recomputes the shuffled view with the current track
    /// first; disabling it maps the index back onto the canonical order.
    pub fn set_shuffle(&mut self, enabled: bool) -> Result<()> {
        self.set_shuffle_with(enabled, &mut thread_rng())
    }

    pub fn set_shuffle_with<R: Rng + ?Sized>(&mut self, enabled: bool, rng: &mut R) -> Result<()> {
        if enabled == self.shuffle {
            return Ok(());
        }

        let current = self.current().id.clone();
        if enabled {
            self.shuffled = reshuffle_with(self.canonical.tracks(), &current, rng)?;
            self.shuffle = true;
            self.current_index = 0;
        } else {
            self.current_index = self
                .canonical
                .position(&current)
                .ok_or(PlaybackError::TrackNotFound(current))?;
            self.shuffle = false;
        }
        Ok(())
    }

    /// Index `advance` would move to, without moving
    pub fn peek(&self, direction: Direction) -> Result<usize> {
        let active = self.active();
        let current = &active[self.current_index].id;
        let index =
            position_of(active, current).ok_or_else(|| PlaybackError::TrackNotFound(current.clone()))?;
        Ok(step_index(index, active.len(), direction, self.mode))
    }

    /// Move to the neighbouring track in the active view
    pub fn advance(&mut self, direction: Direction) -> Result<&Track> {
        self.current_index = self.peek(direction)?;
        Ok(self.current())
    }
}
