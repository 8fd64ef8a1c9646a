//! Trim and loop-crossfade rendering.
//!
//! [`BakePlan::new`] binds resolved parameters to a concrete file length and
//! validates them; [`BakePlan::render`] then builds one output channel. The
//! blend is always equal-power.

use std::f64::consts::FRAC_PI_2;

use crate::error::BoundaryViolation;
use crate::inherit::PlaybackParams;
use crate::pcm::LoopPoints;

/// Validated frame positions for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakePlan {
    start: usize,
    end: usize,
    looped: Option<LoopSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoopSpan {
    start: usize,
    end: usize,
    crossfade: usize,
}

/// Trim and loop points relative to the rendered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BakedPoints {
    pub end: i64,
    pub loop_points: Option<(i64, i64)>,
}

impl BakePlan {
    /// Bind `params` to a file of `length` frames.
    ///
    /// When the region sets neither loop start nor loop end and does not
    /// disable looping, a loop stored in the file (both points above zero) is
    /// adopted.
    pub fn new(
        params: &PlaybackParams,
        length: usize,
        file_loop: Option<LoopPoints>,
    ) -> Result<BakePlan, BoundaryViolation> {
        let mut looping = params.is_looping();
        let mut loop_start = params.loop_start;
        let mut loop_end = params.loop_end.filter(|end| *end >= 0);

        if let Some(points) = file_loop {
            let loop_unset = loop_start.unwrap_or(0) == 0 && loop_end.is_none();
            let allowed = params.loop_enabled != Some(false);
            if points.start > 0 && points.end > 0 && loop_unset && allowed {
                log::debug!("adopting file loop {}..{}", points.start, points.end);
                looping = true;
                loop_start = Some(i64::from(points.start));
                loop_end = Some(i64::from(points.end));
            }
        }

        let file_length = length as i64;
        let last = file_length - 1;
        let start = params.start;
        let end = params.end.filter(|end| *end >= 0).unwrap_or(last);
        let loop_start = loop_start.unwrap_or(0);
        let loop_end = loop_end.unwrap_or(last);
        let crossfade = params.crossfade;

        if start < 0 || start >= file_length {
            return Err(BoundaryViolation::StartOutOfRange { start, length });
        }
        if end >= file_length {
            return Err(BoundaryViolation::EndOutOfRange { end, length });
        }
        if looping {
            if end < loop_start {
                return Err(BoundaryViolation::EndBeforeLoopStart { end, loop_start });
            }
            if end < loop_end {
                return Err(BoundaryViolation::EndBeforeLoopEnd { end, loop_end });
            }
            if start > loop_start - crossfade {
                return Err(BoundaryViolation::StartAfterCrossfadeStart {
                    start,
                    loop_start,
                    crossfade,
                });
            }
            if crossfade < 0 || loop_end - loop_start < crossfade {
                return Err(BoundaryViolation::CrossfadeLongerThanLoop {
                    crossfade,
                    loop_start,
                    loop_end,
                });
            }
        }
        if start > end {
            return Err(BoundaryViolation::StartAfterEnd { start, end });
        }

        // All positions are now known to lie within [0, length)
        Ok(BakePlan {
            start: start as usize,
            end: end as usize,
            looped: looping.then_some(LoopSpan {
                start: loop_start as usize,
                end: loop_end as usize,
                crossfade: crossfade as usize,
            }),
        })
    }

    pub fn is_looping(&self) -> bool {
        self.looped.is_some()
    }

    /// Frames in each rendered channel.
    pub fn output_length(&self) -> usize {
        match self.looped {
            Some(span) => span.end - self.start + 1,
            None => self.end - self.start + 1,
        }
    }

    /// Render one channel. `source` must be the channel the plan was built for.
    pub fn render(&self, source: &[f32]) -> Vec<f32> {
        let Some(span) = self.looped else {
            return source[self.start..=self.end].to_vec();
        };

        let mut out = Vec::with_capacity(self.output_length());
        out.extend_from_slice(&source[self.start..span.start]);
        out.extend_from_slice(&source[span.start..span.end - span.crossfade]);
        for i in 0..=span.crossfade {
            let (fade_out, fade_in) = equal_power_gains(i, span.crossfade);
            let tail = source[span.end - span.crossfade + i];
            let head = source[span.start - span.crossfade + i];
            out.push(tail * fade_out + head * fade_in);
        }
        out
    }

    /// Positions after rendering, with the region start moved to frame 0.
    pub fn rebased(&self) -> BakedPoints {
        let last = self.output_length() as i64 - 1;
        let end = ((self.end - self.start) as i64).min(last);
        BakedPoints {
            end,
            loop_points: self.looped.map(|span| {
                (
                    (span.start - self.start) as i64,
                    (span.end - self.start) as i64,
                )
            }),
        }
    }
}

impl BakedPoints {
    pub fn file_loop(&self) -> Option<LoopPoints> {
        self.loop_points.map(|(start, end)| LoopPoints {
            start: start as u32,
            end: end as u32,
        })
    }
}

/// `(fade_out, fade_in)` gains for step `i` of an `n`-step equal-power blend.
/// A zero-length crossfade yields the outgoing sample untouched.
pub fn equal_power_gains(i: usize, n: usize) -> (f32, f32) {
    if n == 0 {
        return (1.0, 0.0);
    }
    let phase = i as f64 / n as f64 * FRAC_PI_2;
    (phase.cos() as f32, phase.sin() as f32)
}
