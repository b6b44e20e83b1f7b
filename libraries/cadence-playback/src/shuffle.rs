//! Shuffled playlist view
//!
//! The shuffled view keeps the current track at its head so that enabling
//! shuffle never interrupts playback. The remainder is a Fisher-Yates shuffle.

use crate::error::{PlaybackError, Result};
use crate::types::{Track, TrackId};
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Build a shuffled view of `canonical` headed by `current`
pub fn reshuffle(canonical: &[Track], current: &TrackId) -> Result<Vec<Track>> {
    reshuffle_with(canonical, current, &mut thread_rng())
}

/// Same as [`reshuffle`] with a caller-supplied random source
pub fn reshuffle_with<R: Rng + ?Sized>(
    canonical: &[Track],
    current: &TrackId,
    rng: &mut R,
) -> Result<Vec<Track>> {
    let head = canonical
        .iter()
        .find(|track| &track.id == current)
        .cloned()
        .ok_or_else(|| PlaybackError::TrackNotFound(current.clone()))?;

    if canonical.len() == 1 {
        return Ok(canonical.to_vec());
    }

    let mut rest: Vec<Track> = canonical
        .iter()
        .filter(|track| &track.id != current)
        .cloned()
        .collect();
    rest.shuffle(rng);

    let mut shuffled = Vec::with_capacity(canonical.len());
    shuffled.push(head);
    shuffled.extend(rest);
    Ok(shuffled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {}", id), "Test Artist", format!("/music/{}.mp3", id))
    }

    fn playlist(n: usize) -> Vec<Track> {
        (0..n).map(|i| create_test_track(&i.to_string())).collect()
    }

    #[test]
    fn current_track_leads_shuffled_view() {
        let tracks = playlist(8);
        let current = TrackId::from("5");

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let shuffled = reshuffle_with(&tracks, &current, &mut rng).unwrap();
            assert_eq!(shuffled[0].id, current);
        }
    }

    #[test]
    fn shuffle_preserves_all_tracks() {
        let tracks = playlist(6);
        let shuffled = reshuffle(&tracks, &TrackId::from("2")).unwrap();

        assert_eq!(shuffled.len(), tracks.len());
        let ids: HashSet<&TrackId> = shuffled.iter().map(|t| &t.id).collect();
        assert_eq!(ids.len(), 6);
        assert!(tracks.iter().all(|t| ids.contains(&t.id)));
    }

    #[test]
    fn shuffle_changes_order_of_remainder() {
        let tracks = playlist(10);
        let current = TrackId::from("0");
        let original: Vec<&TrackId> = tracks.iter().map(|t| &t.id).collect();

        // 1 in 9! chance per seed of keeping the order; two seeds are enough
        let changed = (0..2u64).any(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let shuffled = reshuffle_with(&tracks, &current, &mut rng).unwrap();
            shuffled.iter().map(|t| &t.id).collect::<Vec<_>>() != original
        });
        assert!(changed);
    }

    #[test]
    fn single_track_is_unchanged() {
        let tracks = playlist(1);
        let shuffled = reshuffle(&tracks, &TrackId::from("0")).unwrap();
        assert_eq!(shuffled, tracks);
    }

    #[test]
    fn unknown_current_track_is_rejected() {
        let tracks = playlist(3);
        let result = reshuffle(&tracks, &TrackId::from("missing"));
        assert_eq!(
            result,
            Err(PlaybackError::TrackNotFound(TrackId::from("missing")))
        );
    }
}
