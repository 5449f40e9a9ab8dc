//! Autonomous eye blink: `Idle -> Closing -> Closed -> Opening -> Idle`.
//!
//! The generator is purely time driven. Phase boundaries are computed from the
//! previous boundary, not from the update that noticed them, so blink timing does not
//! depend on the host frame rate. At most one blink completes per update; after a long
//! gap the next blink is scheduled from `now` instead of replaying missed ones.

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::EyeBlinkConfig;
use crate::params::ParameterStore;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EyePhase {
    Idle,
    Closing,
    Closed,
    Opening,
}

#[derive(Debug, Clone)]
pub struct EyeBlink {
    cfg: EyeBlinkConfig,
    phase: EyePhase,
    phase_start_ms: u64,
    next_blink_ms: Option<u64>,
    ratio: f32,
    rng: StdRng,
}

impl EyeBlink {
    pub fn new(cfg: &EyeBlinkConfig) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            cfg: cfg.clone(),
            phase: EyePhase::Idle,
            phase_start_ms: 0,
            next_blink_ms: None,
            ratio: 1.0,
            rng,
        }
    }

    #[inline]
    pub fn phase(&self) -> EyePhase {
        self.phase
    }

    /// Eye-open ratio written by the last update (1 = open).
    #[inline]
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    #[inline]
    pub fn next_blink_ms(&self) -> Option<u64> {
        self.next_blink_ms
    }

    pub fn config(&self) -> &EyeBlinkConfig {
        &self.cfg
    }

    fn random_wait_ms(&mut self) -> u64 {
        let span = (self.cfg.interval_ms * 2.0).max(0.0);
        (self.rng.gen::<f32>() * span) as u64
    }

    fn phase_len_ms(&self, phase: EyePhase) -> u64 {
        let ms = match phase {
            EyePhase::Idle => 0.0,
            EyePhase::Closing => self.cfg.closing_ms,
            EyePhase::Closed => self.cfg.closed_ms,
            EyePhase::Opening => self.cfg.opening_ms,
        };
        ms.max(0.0) as u64
    }

    fn advance(&mut self, now_ms: u64) {
        let next = match self.next_blink_ms {
            Some(n) => n,
            None => {
                let n = now_ms.saturating_add(self.random_wait_ms());
                self.next_blink_ms = Some(n);
                n
            }
        };

        loop {
            match self.phase {
                EyePhase::Idle => {
                    if now_ms < next {
                        return;
                    }
                    self.phase = EyePhase::Closing;
                    self.phase_start_ms = next;
                }
                EyePhase::Closing | EyePhase::Closed | EyePhase::Opening => {
                    let len = self.phase_len_ms(self.phase);
                    let end = self.phase_start_ms.saturating_add(len);
                    if now_ms < end {
                        return;
                    }
                    self.phase_start_ms = end;
                    self.phase = match self.phase {
                        EyePhase::Closing => EyePhase::Closed,
                        EyePhase::Closed => EyePhase::Opening,
                        _ => EyePhase::Idle,
                    };
                    if self.phase == EyePhase::Idle {
                        let mut next = end.saturating_add(self.random_wait_ms());
                        if next < now_ms {
                            next = now_ms.saturating_add(self.random_wait_ms());
                        }
                        trace!("eye blink: next blink at {next} ms");
                        self.next_blink_ms = Some(next);
                        return;
                    }
                }
            }
        }
    }

    /// Ramps use the same whole-millisecond length that ends the phase.
    fn ratio_at(&self, now_ms: u64) -> f32 {
        let t = now_ms.saturating_sub(self.phase_start_ms) as f32;
        let len = self.phase_len_ms(self.phase) as f32;
        let progress = if len > 0.0 {
            (t / len).clamp(0.0, 1.0)
        } else {
            1.0
        };
        match self.phase {
            EyePhase::Idle => 1.0,
            EyePhase::Closed => 0.0,
            EyePhase::Closing => 1.0 - progress,
            EyePhase::Opening => progress,
        }
    }

    /// Advance to `now_ms` and write the eye-open ratio to both eye parameters.
    pub fn update(&mut self, params: &mut ParameterStore, now_ms: u64) {
        self.advance(now_ms);
        self.ratio = self.ratio_at(now_ms);
        params.set_value(&self.cfg.left_param, self.ratio, 1.0);
        params.set_value(
            &self.cfg.right_param,
            self.ratio * self.cfg.right_eye_scale,
            1.0,
        );
    }
}
