// Conversion between continuous gain ratios and a chip's gain register codes.
//
// Most sensors in the family use a doubling ladder: a coarse analog
// multiplier picked from a short list (1x, 2x, 4x, ...) followed by a fine
// multiplier in a fixed-point format. Chips whose gain register follows a
// different law (decibel steps, SMIA reciprocal codes) are described by their
// own `GainLaw` variant rather than by special-casing code paths.

use serde::Serialize;

/// How a chip turns a real-valued fine gain into an integer code. Both forms
/// are found in the field and must be preserved per chip.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Rounding {
    Round,
    Truncate,
}

impl Rounding {
    fn apply(&self, x: f32) -> f32 {
        match self {
            Rounding::Round => x.round(),
            Rounding::Truncate => x.trunc(),
        }
    }
}

/// One rung of a coarse gain ladder.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CoarseStep {
    pub multiplier: f32,
    /// Value written to the coarse gain register for this rung.
    pub code: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub enum GainLaw {
    /// Coarse multiplier from `steps` (ascending), fine multiplier in
    /// fixed point with `fine_scale` codes per 1.0x. `fine_max` bounds the
    /// fine multiplier on the top rung; on lower rungs a code reaching the
    /// next rung is encoded on that rung instead.
    Ladder {
        steps: &'static [CoarseStep],
        fine_scale: f32,
        fine_max: f32,
        rounding: Rounding,
    },
    /// Analog code in fixed decibel steps, no separate fine code.
    Decibel {
        step_db: f32,
        max_code: u16,
        rounding: Rounding,
    },
    /// SMIA style analog code: `gain = numerator / (numerator - code)`.
    Reciprocal {
        numerator: f32,
        max_code: u16,
        rounding: Rounding,
    },
}

/// A quantized gain: the register codes and the gain they actually produce.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GainCode {
    pub analog_code: u16,
    pub digital_code: u16,
    pub gain: f32,
}

impl GainCode {
    pub fn codes(&self) -> (u16, u16) {
        (self.analog_code, self.digital_code)
    }
}

/// Analog/digital gain ranges a codec can express, for AE base info.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GainRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

#[derive(Copy, Clone, Debug)]
pub struct GainCodec {
    law: &'static GainLaw,
}

impl GainCodec {
    pub fn new(law: &'static GainLaw) -> Self {
        GainCodec{law}
    }

    pub fn law(&self) -> &'static GainLaw {
        self.law
    }

    /// Quantizes `gain` after flooring it at unity and saturating it into
    /// `[g_min, g_max]`. Never fails.
    pub fn encode(&self, g_min: f32, g_max: f32, gain: f32) -> GainCode {
        let g = gain.max(1.0).max(g_min).min(g_max).max(1.0);
        match *self.law {
            GainLaw::Ladder{steps, fine_scale, fine_max, rounding} => {
                let idx = steps.iter().rposition(|s| s.multiplier <= g).unwrap_or(0);
                let step = steps[idx];
                let code = rounding.apply(g / step.multiplier * fine_scale).max(fine_scale);
                let code = match steps.get(idx + 1) {
                    // A code at or past the next rung's boundary belongs to
                    // that rung; the fine field cannot hold it here.
                    Some(next) if code >= next.multiplier / step.multiplier * fine_scale => {
                        return GainCode{analog_code: next.code,
                                        digital_code: fine_scale as u16,
                                        gain: next.multiplier};
                    },
                    Some(_) => code,
                    None => code.min((fine_max * fine_scale).floor()),
                };
                GainCode{analog_code: step.code,
                         digital_code: code as u16,
                         gain: step.multiplier * code / fine_scale}
            },
            GainLaw::Decibel{step_db, max_code, rounding} => {
                let db = 20.0 * g.log10();
                let code = rounding.apply(db / step_db).max(0.0).min(max_code as f32) as u16;
                GainCode{analog_code: code, digital_code: 0,
                         gain: decibel_gain(step_db, code)}
            },
            GainLaw::Reciprocal{numerator, max_code, rounding} => {
                let code = rounding.apply(numerator - numerator / g)
                    .max(0.0).min(max_code as f32) as u16;
                GainCode{analog_code: code, digital_code: 0,
                         gain: numerator / (numerator - code as f32)}
            },
        }
    }

    /// Exact inverse of `encode`. Returns None when `analog_code` is not a
    /// code this law can produce.
    pub fn decode(&self, analog_code: u16, digital_code: u16) -> Option<f32> {
        match *self.law {
            GainLaw::Ladder{steps, fine_scale, ..} => {
                let step = steps.iter().find(|s| s.code == analog_code)?;
                Some(step.multiplier * digital_code as f32 / fine_scale)
            },
            GainLaw::Decibel{step_db, max_code, ..} => {
                if analog_code > max_code {
                    return None;
                }
                Some(decibel_gain(step_db, analog_code))
            },
            GainLaw::Reciprocal{numerator, max_code, ..} => {
                if analog_code > max_code {
                    return None;
                }
                Some(numerator / (numerator - analog_code as f32))
            },
        }
    }

    /// All `(analog, digital)` pairs that `encode` can produce, in ascending
    /// gain order.
    pub fn grid(&self) -> Vec<(u16, u16)> {
        match *self.law {
            GainLaw::Ladder{steps, fine_scale, fine_max, ..} => {
                let mut grid = vec![];
                for (i, step) in steps.iter().enumerate() {
                    let first = fine_scale as u32;
                    let last = match steps.get(i + 1) {
                        // The code equal to the next rung belongs to that rung.
                        Some(next) => {
                            let top = next.multiplier / step.multiplier * fine_scale;
                            if top.fract() == 0.0 { top as u32 - 1 } else { top.floor() as u32 }
                        },
                        None => (fine_max * fine_scale).floor() as u32,
                    };
                    for code in first..=last {
                        grid.push((step.code, code as u16));
                    }
                }
                grid
            },
            GainLaw::Decibel{max_code, ..} | GainLaw::Reciprocal{max_code, ..} =>
                (0..=max_code).map(|c| (c, 0)).collect(),
        }
    }

    pub fn analog_range(&self) -> GainRange {
        match *self.law {
            GainLaw::Ladder{steps, ..} => {
                let min = steps.first().map_or(1.0, |s| s.multiplier);
                let max = steps.last().map_or(1.0, |s| s.multiplier);
                let step = steps.windows(2)
                    .map(|w| w[1].multiplier - w[0].multiplier)
                    .fold(f32::INFINITY, f32::min);
                GainRange{min, max, step: if step.is_finite() { step } else { 0.0 }}
            },
            GainLaw::Decibel{step_db, max_code, ..} =>
                GainRange{min: 1.0, max: decibel_gain(step_db, max_code),
                          step: decibel_gain(step_db, 1) - 1.0},
            GainLaw::Reciprocal{numerator, max_code, ..} =>
                GainRange{min: 1.0, max: numerator / (numerator - max_code as f32),
                          step: numerator / (numerator - 1.0) - 1.0},
        }
    }

    pub fn digital_range(&self) -> GainRange {
        match *self.law {
            GainLaw::Ladder{fine_scale, fine_max, ..} =>
                GainRange{min: 1.0, max: fine_max, step: 1.0 / fine_scale},
            GainLaw::Decibel{..} | GainLaw::Reciprocal{..} =>
                GainRange{min: 1.0, max: 1.0, step: 0.0},
        }
    }
}

fn decibel_gain(step_db: f32, code: u16) -> f32 {
    10f32.powf(code as f32 * step_db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    static POW2_STEPS: [CoarseStep; 4] = [
        CoarseStep{multiplier: 1.0, code: 0},
        CoarseStep{multiplier: 2.0, code: 1},
        CoarseStep{multiplier: 4.0, code: 3},
        CoarseStep{multiplier: 8.0, code: 7},
    ];
    static Q4_10_ROUND: GainLaw = GainLaw::Ladder{
        steps: &POW2_STEPS, fine_scale: 1024.0, fine_max: 2.0,
        rounding: Rounding::Round};
    static Q1_4_TRUNC: GainLaw = GainLaw::Ladder{
        steps: &POW2_STEPS, fine_scale: 16.0, fine_max: 1.9375,
        rounding: Rounding::Truncate};
    static Q1_4_TRUNC_AS_ROUND: GainLaw = GainLaw::Ladder{
        steps: &POW2_STEPS, fine_scale: 16.0, fine_max: 1.9375,
        rounding: Rounding::Round};
    static SONY_DB: GainLaw = GainLaw::Decibel{
        step_db: 0.3, max_code: 240, rounding: Rounding::Round};
    static SMIA: GainLaw = GainLaw::Reciprocal{
        numerator: 1024.0, max_code: 960, rounding: Rounding::Round};

    #[test]
    fn ladder_picks_largest_coarse_step() {
        let codec = GainCodec::new(&Q4_10_ROUND);
        let code = codec.encode(1.0, 16.0, 5.0);
        assert_eq!(code.analog_code, 3);
        assert_eq!(code.digital_code, 1280);
        assert_eq!(code.gain, 5.0);
    }

    #[test]
    fn below_unity_floors_to_one() {
        let codec = GainCodec::new(&Q4_10_ROUND);
        assert_eq!(codec.encode(1.0, 16.0, 0.5), codec.encode(1.0, 16.0, 1.0));
        assert_eq!(codec.encode(1.0, 16.0, 0.5).gain, 1.0);
    }

    #[test]
    fn rounding_up_to_a_rung_boundary_moves_to_that_rung() {
        let codec = GainCodec::new(&Q4_10_ROUND);
        for (below, coarse) in [(1.9997, 1), (3.9995, 3), (7.999, 7)] {
            let code = codec.encode(1.0, 16.0, below);
            assert_eq!(code.codes(), (coarse, 1024), "gain {}", below);
            assert_eq!(code.gain, codec.decode(coarse, 1024).unwrap());
        }
        // Just under the rounding threshold stays on the lower rung.
        assert_eq!(codec.encode(1.0, 16.0, 1.999).codes(), (0, 2047));
        // Truncation never reaches the boundary.
        let trunc = GainCodec::new(&Q1_4_TRUNC);
        assert_eq!(trunc.encode(1.0, 15.0, 1.999).codes(), (0, 31));
    }

    #[test]
    fn truncate_and_round_differ() {
        // 1.03 * 16 = 16.48 -> 16 either way; 1.06 * 16 = 16.96 -> 17 vs 16.
        let trunc = GainCodec::new(&Q1_4_TRUNC);
        let round = GainCodec::new(&Q1_4_TRUNC_AS_ROUND);
        assert_eq!(trunc.encode(1.0, 15.0, 1.06).digital_code, 16);
        assert_eq!(round.encode(1.0, 15.0, 1.06).digital_code, 17);
    }

    #[test]
    fn clamp_idempotence() {
        for law in [&Q4_10_ROUND, &Q1_4_TRUNC, &SONY_DB, &SMIA] {
            let codec = GainCodec::new(law);
            assert_eq!(codec.encode(1.5, 10.0, 50.0), codec.encode(1.5, 10.0, 10.0));
            assert_eq!(codec.encode(1.5, 10.0, 1.2), codec.encode(1.5, 10.0, 1.5));
        }
    }

    #[test]
    fn round_trip_on_grid() {
        for law in [&Q4_10_ROUND, &Q1_4_TRUNC, &SONY_DB, &SMIA] {
            let codec = GainCodec::new(law);
            for (a, d) in codec.grid() {
                let g = codec.decode(a, d).unwrap();
                let code = codec.encode(1.0, f32::MAX, g);
                assert_eq!(code.codes(), (a, d), "law {:?} gain {}", law, g);
                assert_eq!(code.gain, g);
            }
        }
    }

    #[test]
    fn monotonic() {
        for law in [&Q4_10_ROUND, &Q1_4_TRUNC, &SONY_DB, &SMIA] {
            let codec = GainCodec::new(law);
            let mut prev = 0.0;
            let mut g = 0.9f32;
            while g < 40.0 {
                let q = codec.encode(1.0, 32.0, g).gain;
                assert!(q >= prev, "law {:?}: {} -> {} after {}", law, g, q, prev);
                prev = q;
                g += 0.013;
            }
        }
    }

    #[test]
    fn decode_rejects_unknown_coarse_code() {
        let codec = GainCodec::new(&Q4_10_ROUND);
        assert_eq!(codec.decode(2, 1024), None);
        assert_eq!(GainCodec::new(&SONY_DB).decode(241, 0), None);
    }

    #[test]
    fn decibel_law() {
        let codec = GainCodec::new(&SONY_DB);
        // 6.02 dB is ~20 steps of 0.3 dB.
        let code = codec.encode(1.0, 100.0, 2.0);
        assert_eq!(code.analog_code, 20);
        assert!((code.gain - 1.9953).abs() < 1e-3);
    }

    #[test]
    fn reciprocal_law() {
        let codec = GainCodec::new(&SMIA);
        let code = codec.encode(1.0, 16.0, 4.0);
        assert_eq!(code.analog_code, 768);
        assert_eq!(code.gain, 4.0);
    }

    #[test]
    fn ranges() {
        let codec = GainCodec::new(&Q4_10_ROUND);
        assert_eq!(codec.analog_range(), GainRange{min: 1.0, max: 8.0, step: 1.0});
        assert_eq!(codec.digital_range(), GainRange{min: 1.0, max: 2.0, step: 1.0 / 1024.0});
    }
}
