//! Selector: draw the requested number of questions from a filtered pool,
//! preferring questions not served recently, and record what was served.
//!
//! Flow per call:
//!   1) Pool no larger than the request: return it as-is, no bookkeeping.
//!   2) Sweep expired recency entries.
//!   3) Seed a local generator from the session token (or the clock).
//!   4) Partition into fresh / stale (stale ordered oldest-served first).
//!   5) Sample from fresh; top up from stale when fresh runs short.
//!   6) Mark everything selected as served now.
//!
//! The generator lives only for the duration of a call, so a session seed
//! never leaks into randomness used elsewhere in the process.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, instrument};

use crate::clock::{unix_secs, Clock};
use crate::domain::QuestionRecord;
use crate::recency::RecencyTracker;

/// Digits of a session token that feed the draw seed.
const SEED_DIGITS: usize = 10;

/// Seed for a selection draw.
///
/// The first ten ASCII digits embedded in the session token, read as a
/// decimal number. Tokens without digits, and absent tokens, fall back to
/// the current unix time in seconds. Tokens sharing a digit prefix collide.
pub fn derive_draw_seed(session_token: Option<&str>, now: SystemTime) -> u64 {
    session_token
        .map(|t| t.chars().filter(char::is_ascii_digit).take(SEED_DIGITS).collect::<String>())
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or_else(|| unix_secs(now))
}

pub struct Selector {
    tracker: Arc<RecencyTracker>,
    clock: Arc<dyn Clock>,
}

impl Selector {
    pub fn new(tracker: Arc<RecencyTracker>, clock: Arc<dyn Clock>) -> Self {
        Self { tracker, clock }
    }

    /// Choose up to `num_questions` distinct questions from `candidates`.
    #[instrument(level = "debug", skip(self, candidates, session_token), fields(pool = candidates.len(), %category))]
    pub fn select(
        &self,
        candidates: &[QuestionRecord],
        num_questions: usize,
        category: &str,
        session_token: Option<&str>,
    ) -> Vec<QuestionRecord> {
        if candidates.len() <= num_questions {
            debug!(target: "selection", pool = candidates.len(), requested = num_questions, "Pool fits request; serving all without recency bookkeeping");
            return candidates.to_vec();
        }

        let now = self.clock.now();
        self.tracker.sweep(now);
        let cooldown = self.tracker.cooldown();
        let seed = derive_draw_seed(session_token, now);
        let mut rng = StdRng::seed_from_u64(seed);

        self.tracker.with_table(category, |table| {
            let mut seen = HashSet::new();
            let mut fresh: Vec<&QuestionRecord> = Vec::new();
            let mut stale: Vec<(SystemTime, &QuestionRecord)> = Vec::new();
            for q in candidates {
                if !seen.insert(&q.id) {
                    continue;
                }
                match table.served_within(&q.id, now, cooldown) {
                    Some(at) => stale.push((at, q)),
                    None => fresh.push(q),
                }
            }
            // Stable: equal stamps keep pool order.
            stale.sort_by_key(|(at, _)| *at);

            let selected: Vec<QuestionRecord> = if fresh.len() >= num_questions {
                fresh
                    .choose_multiple(&mut rng, num_questions)
                    .map(|q| (*q).clone())
                    .collect()
            } else {
                let missing = num_questions - fresh.len();
                fresh
                    .iter()
                    .map(|q| (*q).clone())
                    .chain(stale.iter().take(missing).map(|(_, q)| (*q).clone()))
                    .collect()
            };

            for q in &selected {
                table.mark_used(q.id.clone(), now);
            }

            debug!(
                target: "selection",
                seed,
                fresh = fresh.len(),
                stale = stale.len(),
                selected = selected.len(),
                "Drew questions"
            );
            selected
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::{sample_question, Difficulty, QuestionId};
    use rand::{Rng, RngCore};
    use std::time::{Duration, UNIX_EPOCH};

    const NOW: u64 = 1_700_000_000;

    fn pool(n: usize) -> Vec<QuestionRecord> {
        (0..n)
            .map(|i| sample_question("1", &format!("question {i}"), Difficulty::Beginner, ""))
            .collect()
    }

    fn selector_at(secs: u64) -> (Selector, Arc<RecencyTracker>, Arc<ManualClock>) {
        let tracker = Arc::new(RecencyTracker::new(Duration::from_secs(3600)));
        let clock = Arc::new(ManualClock::at_secs(secs));
        (Selector::new(tracker.clone(), clock.clone()), tracker, clock)
    }

    fn ids(qs: &[QuestionRecord]) -> Vec<QuestionId> {
        qs.iter().map(|q| q.id.clone()).collect()
    }

    #[test]
    fn seed_uses_first_ten_digits_of_token() {
        let now = UNIX_EPOCH + Duration::from_secs(NOW);
        assert_eq!(derive_draw_seed(Some("api_1234567890123_xyz"), now), 1_234_567_890);
        assert_eq!(derive_draw_seed(Some("s-4-2"), now), 42);
        assert_eq!(derive_draw_seed(Some("00007"), now), 7);
    }

    #[test]
    fn seed_falls_back_to_clock() {
        let now = UNIX_EPOCH + Duration::from_secs(NOW);
        assert_eq!(derive_draw_seed(None, now), NOW);
        assert_eq!(derive_draw_seed(Some("no-digits-here"), now), NOW);
        assert_eq!(derive_draw_seed(Some(""), now), NOW);
    }

    #[test]
    fn small_pool_is_returned_unchanged_without_bookkeeping() {
        let (selector, tracker, _) = selector_at(NOW);
        let candidates = pool(4);
        for n in [4, 5, 50] {
            let out = selector.select(&candidates, n, "1", Some("session-1"));
            assert_eq!(out, candidates);
        }
        assert!(tracker.snapshot("1").is_empty());
    }

    #[test]
    fn empty_pool_yields_empty_result() {
        let (selector, tracker, _) = selector_at(NOW);
        assert!(selector.select(&[], 3, "1", None).is_empty());
        assert!(tracker.snapshot("1").is_empty());
    }

    #[test]
    fn large_pool_yields_exact_count_without_duplicates() {
        let (selector, tracker, clock) = selector_at(NOW);
        let candidates = pool(30);
        for (round, n) in [1usize, 7, 12, 29].into_iter().enumerate() {
            let token = format!("tok{round}");
            let out = selector.select(&candidates, n, "1", Some(token.as_str()));
            assert_eq!(out.len(), n);
            let unique: HashSet<_> = ids(&out).into_iter().collect();
            assert_eq!(unique.len(), n);
            clock.advance(Duration::from_secs(1));
        }
        assert!(!tracker.snapshot("1").is_empty());
    }

    #[test]
    fn selected_questions_are_marked_at_now() {
        let (selector, tracker, _) = selector_at(NOW);
        let out = selector.select(&pool(10), 3, "1", Some("77"));
        let table = tracker.snapshot("1");
        assert_eq!(table.len(), 3);
        for q in &out {
            assert_eq!(table.last_served(&q.id), Some(UNIX_EPOCH + Duration::from_secs(NOW)));
        }
    }

    #[test]
    fn same_inputs_same_draw() {
        let candidates = pool(25);
        let (a, _, _) = selector_at(NOW);
        let (b, _, _) = selector_at(NOW);
        let ra = a.select(&candidates, 6, "1", Some("sess_20240101_0042"));
        let rb = b.select(&candidates, 6, "1", Some("sess_20240101_0042"));
        assert_eq!(ids(&ra), ids(&rb));
    }

    #[test]
    fn tokenless_draw_is_reproducible_for_fixed_clock() {
        let candidates = pool(25);
        let (a, _, _) = selector_at(NOW);
        let (b, _, _) = selector_at(NOW);
        assert_eq!(ids(&a.select(&candidates, 5, "1", None)), ids(&b.select(&candidates, 5, "1", None)));
    }

    #[test]
    fn fresh_questions_are_preferred_then_oldest_stale() {
        let (selector, tracker, _) = selector_at(NOW);
        let candidates = pool(5);
        let now = UNIX_EPOCH + Duration::from_secs(NOW);
        // q3 served 100s ago, q4 served 50s ago.
        tracker.mark_used("1", candidates[4].id.clone(), now - Duration::from_secs(50));
        tracker.mark_used("1", candidates[3].id.clone(), now - Duration::from_secs(100));

        let out = selector.select(&candidates, 4, "1", Some("123"));
        let got = ids(&out);
        assert_eq!(got.len(), 4);
        for fresh in &candidates[..3] {
            assert!(got.contains(&fresh.id));
        }
        assert!(got.contains(&candidates[3].id));
        assert!(!got.contains(&candidates[4].id));
        assert_eq!(got[3], candidates[3].id);
    }

    #[test]
    fn enough_fresh_means_no_stale() {
        let (selector, tracker, _) = selector_at(NOW);
        let candidates = pool(8);
        let now = UNIX_EPOCH + Duration::from_secs(NOW);
        for q in &candidates[..3] {
            tracker.mark_used("1", q.id.clone(), now - Duration::from_secs(10));
        }
        let out = selector.select(&candidates, 5, "1", Some("9"));
        let stale: HashSet<_> = ids(&candidates[..3]).into_iter().collect();
        assert!(ids(&out).iter().all(|id| !stale.contains(id)));
    }

    #[test]
    fn consecutive_sessions_avoid_repeats_within_cooldown() {
        let (selector, _, clock) = selector_at(NOW);
        let candidates = pool(20);
        let first = selector.select(&candidates, 10, "1", Some("1"));
        clock.advance(Duration::from_secs(60));
        let second = selector.select(&candidates, 10, "1", Some("1"));
        let first_ids: HashSet<_> = ids(&first).into_iter().collect();
        assert!(ids(&second).iter().all(|id| !first_ids.contains(id)));
    }

    #[test]
    fn expired_entries_count_as_fresh_again() {
        let (selector, tracker, clock) = selector_at(NOW);
        let candidates = pool(6);
        selector.select(&candidates, 5, "1", Some("5"));
        clock.advance(Duration::from_secs(3600));
        let out = selector.select(&candidates, 5, "1", Some("5"));
        assert_eq!(out.len(), 5);
        // The sweep cleared the previous round; only this round's marks remain.
        assert_eq!(tracker.snapshot("1").len(), 5);
    }

    #[test]
    fn duplicate_prompts_are_served_once() {
        let (selector, _, _) = selector_at(NOW);
        let mut candidates = pool(3);
        candidates.push(candidates[0].clone());
        candidates.push(candidates[1].clone());
        let out = selector.select(&candidates, 4, "1", Some("1"));
        let unique: HashSet<_> = ids(&out).into_iter().collect();
        assert_eq!(unique.len(), out.len());
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn select_leaves_callers_generator_untouched() {
        let (selector, _, _) = selector_at(NOW);
        let candidates = pool(40);
        let mut reference = StdRng::seed_from_u64(4242);
        let expected: Vec<u64> = (0..4).map(|_| reference.next_u64()).collect();

        let mut mine = StdRng::seed_from_u64(4242);
        let first = mine.next_u64();
        // Same seed value as `mine`; the draw must use its own generator.
        selector.select(&candidates, 10, "1", Some("4242"));
        let rest: Vec<u64> = (0..3).map(|_| mine.next_u64()).collect();

        assert_eq!(first, expected[0]);
        assert_eq!(rest, &expected[1..]);
    }

    #[test]
    fn concurrent_selections_never_share_questions() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 10;
        let (selector, tracker, _) = selector_at(NOW);
        let selector = Arc::new(selector);
        let candidates = Arc::new(pool(THREADS * PER_THREAD));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let selector = selector.clone();
                let candidates = candidates.clone();
                std::thread::spawn(move || {
                    let token = format!("session-{i}");
                    selector.select(&candidates, PER_THREAD, "1", Some(token.as_str()))
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            let out = h.join().expect("thread");
            assert_eq!(out.len(), PER_THREAD);
            for q in out {
                assert!(seen.insert(q.id), "question served to two concurrent sessions");
            }
        }
        assert_eq!(seen.len(), THREADS * PER_THREAD);
        assert_eq!(tracker.snapshot("1").len(), THREADS * PER_THREAD);
    }

    #[test]
    fn selection_is_unaffected_by_unrelated_randomness() {
        let candidates = pool(40);
        let (a, _, _) = selector_at(NOW);
        let (b, _, _) = selector_at(NOW);
        let ra = a.select(&candidates, 10, "1", Some("31337"));
        let _noise: Vec<u32> = (0..100).map(|_| rand::thread_rng().gen()).collect();
        let rb = b.select(&candidates, 10, "1", Some("31337"));
        assert_eq!(ids(&ra), ids(&rb));
    }
}
