//! Reward sequencer
//!
//! A treasure collection starts a celebration: CONTINUOUS fireworks with a
//! forced salvo, plus a banner that closes slightly before the fireworks stop.
//! Re-triggering during an active reward cancels both timers and starts over,
//! so only the latest deadline ever reverts the fireworks.

use super::mode::ModeEvent;
use super::timer::{Scheduler, TimerHandle};
use crate::tuning::RewardTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RewardSignal {
    EndFireworks,
    CloseBanner,
}

/// Orchestrates the timed celebration window
#[derive(Debug, Clone)]
pub struct RewardSequencer {
    timers: Scheduler<RewardSignal>,
    fireworks_timer: Option<TimerHandle>,
    banner_timer: Option<TimerHandle>,
    banner_open: bool,
    /// Bumped on every trigger so the presentation can restart its animation
    banner_generation: u32,
    last_reward_time: Option<f64>,
    tuning: RewardTuning,
}

impl RewardSequencer {
    pub fn new(tuning: RewardTuning) -> Self {
        Self {
            timers: Scheduler::new(),
            fireworks_timer: None,
            banner_timer: None,
            banner_open: false,
            banner_generation: 0,
            last_reward_time: None,
            tuning,
        }
    }

    /// Start (or restart) the celebration. Returns the event for the firework engine.
    pub fn trigger(&mut self, now: f64) -> ModeEvent {
        self.cancel_timers();

        self.banner_open = true;
        self.banner_generation = self.banner_generation.wrapping_add(1);
        self.last_reward_time = Some(now);

        self.fireworks_timer = Some(self.timers.schedule(
            now,
            self.tuning.duration,
            RewardSignal::EndFireworks,
        ));
        self.banner_timer = Some(self.timers.schedule(
            now,
            self.tuning.banner_duration,
            RewardSignal::CloseBanner,
        ));

        log::info!(
            "Reward sequence started at {:.2}s (generation {})",
            now,
            self.banner_generation
        );
        ModeEvent::Reward
    }

    /// Fire due timers. Returns `true` when the fireworks duration just ended.
    pub fn update(&mut self, now: f64) -> bool {
        let mut ended = false;
        for (handle, signal) in self.timers.poll_due(now) {
            match signal {
                RewardSignal::EndFireworks => {
                    if self.fireworks_timer == Some(handle) {
                        self.fireworks_timer = None;
                        ended = true;
                        log::info!("Reward fireworks window ended at {:.2}s", now);
                    }
                }
                RewardSignal::CloseBanner => {
                    if self.banner_timer == Some(handle) {
                        self.banner_timer = None;
                        self.banner_open = false;
                    }
                }
            }
        }
        ended
    }

    fn cancel_timers(&mut self) {
        if let Some(h) = self.fireworks_timer.take() {
            self.timers.cancel(h);
        }
        if let Some(h) = self.banner_timer.take() {
            self.timers.cancel(h);
        }
    }

    /// Teardown: drop every pending timer and close the banner
    pub fn cancel_all(&mut self) {
        self.cancel_timers();
        self.timers.clear();
        self.banner_open = false;
    }

    pub fn is_active(&self) -> bool {
        self.fireworks_timer.is_some()
    }

    pub fn banner_open(&self) -> bool {
        self.banner_open
    }

    pub fn banner_generation(&self) -> u32 {
        self.banner_generation
    }

    pub fn last_reward_time(&self) -> Option<f64> {
        self.last_reward_time
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_reward_timeline() {
        let mut reward = RewardSequencer::new(RewardTuning::default());
        assert_eq!(reward.trigger(0.0), ModeEvent::Reward);
        assert!(reward.banner_open());

        assert!(!reward.update(17.9));
        assert!(reward.banner_open());

        assert!(!reward.update(18.0));
        assert!(!reward.banner_open());
        assert!(reward.is_active());

        assert!(reward.update(20.0));
        assert!(!reward.is_active());
        assert_eq!(reward.pending_timers(), 0);
    }

    #[test]
    fn test_retrigger_restarts_instead_of_stacking() {
        let mut reward = RewardSequencer::new(RewardTuning::default());
        reward.trigger(0.0);
        reward.trigger(5.0);
        assert_eq!(reward.pending_timers(), 2);

        let mut reverts = Vec::new();
        let mut t = 0.0;
        while t <= 30.0 {
            if reward.update(t) {
                reverts.push(t);
            }
            t += 0.5;
        }
        assert_eq!(reverts, vec![25.0]);
        assert_eq!(reward.banner_generation(), 2);
    }

    #[test]
    fn test_rapid_triggers_do_not_leak_timers() {
        let mut reward = RewardSequencer::new(RewardTuning::default());
        for i in 0..50 {
            reward.trigger(i as f64 * 0.01);
        }
        assert_eq!(reward.pending_timers(), 2);
    }

    #[test]
    fn test_cancel_all_closes_banner() {
        let mut reward = RewardSequencer::new(RewardTuning::default());
        reward.trigger(0.0);
        reward.cancel_all();
        assert!(!reward.banner_open());
        assert!(!reward.update(100.0));
    }
}
