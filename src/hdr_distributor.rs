// Splits one AE request (total gain x total integration time) across the
// exposure channels of an HDR mode. Channel i sees E * ratio[i] * ... *
// ratio[n-2], where E = gain * time and the last channel sees E. A window's
// time is bounded by the frame budget and by its channels' maximum lines;
// whatever the time cannot carry is made up with gain.

use log::debug;
use serde::Serialize;

use crate::error::IsiError;
use crate::mode::{ExposureChannel, SensorMode};

pub const DEFAULT_HDR_RATIO: f32 = 16.0;

/// What to do with a missing, zero, negative or non-finite HDR ratio.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub enum RatioPolicy {
    /// Quietly use the given ratio instead.
    SubstituteDefault(f32),
    /// Refuse the request with `InvalidArgument`.
    Reject,
}

impl Default for RatioPolicy {
    fn default() -> Self {
        RatioPolicy::SubstituteDefault(DEFAULT_HDR_RATIO)
    }
}

/// Target for one channel, before quantization.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ChannelTarget {
    pub channel: ExposureChannel,
    pub window: u8,
    pub gain: f32,
    pub integration_time: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Distribution {
    pub targets: Vec<ChannelTarget>,
    /// Ratios after policy substitution, one per ratio slot.
    pub ratios: Vec<f32>,
    pub budget: f32,
    /// True when the budget had to be split and gain absorbs the rest.
    pub split: bool,
}

impl Distribution {
    pub fn target(&self, channel: ExposureChannel) -> Option<&ChannelTarget> {
        self.targets.iter().find(|t| t.channel == channel)
    }

    /// Integration time consumed by all windows together.
    pub fn allotted_time(&self) -> f32 {
        let mut seen: Vec<u8> = vec![];
        let mut total = 0.0;
        for t in &self.targets {
            if !seen.contains(&t.window) {
                seen.push(t.window);
                total += t.integration_time;
            }
        }
        total
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct HdrDistributor {
    policy: RatioPolicy,
}

impl HdrDistributor {
    pub fn new(policy: RatioPolicy) -> Self {
        HdrDistributor{policy}
    }

    pub fn policy(&self) -> RatioPolicy {
        self.policy
    }

    /// Applies the ratio policy to `ratios`, yielding exactly `slots` values.
    pub fn resolve_ratios(&self, ratios: &[f32], slots: usize)
                          -> Result<Vec<f32>, IsiError> {
        let mut resolved = Vec::with_capacity(slots);
        for slot in 0..slots {
            match ratios.get(slot).copied() {
                Some(r) if r.is_finite() && r > 0.0 => resolved.push(r),
                other => match self.policy {
                    RatioPolicy::SubstituteDefault(default) => {
                        debug!("HDR ratio slot {} is {:?}; using {}", slot, other, default);
                        resolved.push(default);
                    },
                    RatioPolicy::Reject => {
                        return Err(IsiError::invalid_argument(
                            format!("HDR ratio slot {} is {:?}", slot, other)));
                    },
                },
            }
        }
        Ok(resolved)
    }

    pub fn distribute(&self, mode: &SensorMode, total_gain: f32, total_time: f32,
                      ratios: &[f32]) -> Result<Distribution, IsiError> {
        if !mode.topology.is_hdr() || mode.channels.len() < 2 {
            return Err(IsiError::not_supported(
                format!("mode {} has no HDR channels to distribute", mode.index)));
        }
        let ratios = self.resolve_ratios(ratios, mode.ratio_slots())?;
        let exposure = total_gain.max(0.0) * total_time.max(0.0);

        // Relative exposure of each channel; the last one is 1.
        let n = mode.channels.len();
        let mut weights = vec![1.0f32; n];
        for i in (0..n - 1).rev() {
            weights[i] = weights[i + 1] * ratios[i];
        }

        // A window's time is driven by its least exposed member and capped
        // by the shortest maximum integration of its members.
        let mut windows: Vec<Window> = vec![];
        for (spec, &w) in mode.channels.iter().zip(&weights) {
            let cap = spec.max_lines as f32 * mode.one_line_time;
            match windows.iter_mut().find(|win| win.id == spec.window) {
                Some(win) => {
                    win.weight = win.weight.min(w);
                    win.cap = win.cap.min(cap);
                },
                None => windows.push(Window{id: spec.window, weight: w, cap, time: 0.0}),
            }
        }
        let budget = mode.time_budget();
        let split = windows.iter().map(|win| win.upper(exposure)).sum::<f32>() > budget;
        if split {
            fill_budget(&mut windows, exposure, budget);
        } else {
            for win in windows.iter_mut() {
                win.time = win.upper(exposure);
            }
        }

        let targets = mode.channels.iter().zip(&weights).map(|(spec, &w)| {
            let (ww, time) = windows.iter().find(|win| win.id == spec.window)
                .map_or((w, exposure * w), |win| (win.weight, win.time));
            // Whatever the window's time cannot carry becomes gain.
            let gain = if time < exposure * ww && time > 0.0 {
                exposure * w / time
            } else {
                w / ww
            };
            ChannelTarget{channel: spec.channel, window: spec.window,
                          gain, integration_time: time}
        }).collect();

        Ok(Distribution{targets, ratios, budget, split})
    }
}

struct Window {
    id: u8,
    weight: f32,
    // Longest integration time every member can hold.
    cap: f32,
    time: f32,
}

impl Window {
    // Time the window would take with no frame budget to respect.
    fn upper(&self, exposure: f32) -> f32 {
        (exposure * self.weight).min(self.cap)
    }
}

// Shares `budget` among the windows in proportion to their weights. A window
// whose share exceeds its upper bound is pinned there and the rest of the
// budget is shared again among the others.
fn fill_budget(windows: &mut [Window], exposure: f32, budget: f32) {
    let mut pinned = vec![false; windows.len()];
    loop {
        let used: f32 = windows.iter().zip(&pinned)
            .filter(|(_, p)| **p).map(|(win, _)| win.time).sum();
        let free_weight: f32 = windows.iter().zip(&pinned)
            .filter(|(_, p)| !**p).map(|(win, _)| win.weight).sum();
        if free_weight <= 0.0 {
            return;
        }
        let share = (budget - used).max(0.0) / free_weight;
        let mut pinned_any = false;
        for (win, p) in windows.iter_mut().zip(pinned.iter_mut()) {
            if !*p && win.weight * share >= win.upper(exposure) {
                win.time = win.upper(exposure);
                *p = true;
                pinned_any = true;
            }
        }
        if !pinned_any {
            for (win, p) in windows.iter_mut().zip(&pinned) {
                if !*p {
                    win.time = win.weight * share;
                }
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{BayerPattern, ChannelSpec, FpsRange, GainBounds, HdrTopology};

    const BOUNDS: GainBounds = GainBounds{min: 1.0, max: 64.0,
                                          step_analog: 1.0, step_digital: 1.0 / 256.0};

    const fn spec(channel: ExposureChannel, window: u8) -> ChannelSpec {
        ChannelSpec{channel, window, gain: BOUNDS, min_lines: 1, max_lines: 1240}
    }

    static TWO: [ChannelSpec; 2] = [spec(ExposureChannel::Long, 0),
                                    spec(ExposureChannel::Short, 1)];
    static THREE: [ChannelSpec; 3] = [spec(ExposureChannel::Long, 0),
                                      spec(ExposureChannel::Short, 1),
                                      spec(ExposureChannel::VeryShort, 2)];
    static DCG: [ChannelSpec; 3] = [spec(ExposureChannel::Hcg, 0),
                                    spec(ExposureChannel::Lcg, 0),
                                    spec(ExposureChannel::VeryShort, 1)];

    static SHORT_VS: [ChannelSpec; 3] = [
        spec(ExposureChannel::Long, 0),
        spec(ExposureChannel::Short, 1),
        ChannelSpec{channel: ExposureChannel::VeryShort, window: 2, gain: BOUNDS,
                    min_lines: 1, max_lines: 8},
    ];

    fn mode(channels: &'static [ChannelSpec], topology: HdrTopology) -> SensorMode {
        SensorMode{index: 1, width: 1920, height: 1080, bit_width: 12,
                   bayer: BayerPattern::Bggr, topology,
                   fps: FpsRange{min: 1.0, max: 30.0},
                   one_line_time: 0.000_063_06, frame_length_lines: 0x4e2,
                   channels, init_sequence: &[]}
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4 * b.abs().max(1e-3)
    }

    #[test]
    fn two_channel_split() {
        let m = mode(&TWO, HdrTopology::Stitched{guard_lines: 10});
        let d = HdrDistributor::default().distribute(&m, 1.0, 0.02, &[16.0]).unwrap();
        let budget = 1240.0 * 0.000_063_06;
        assert!(d.split);
        let long = d.target(ExposureChannel::Long).unwrap();
        let short = d.target(ExposureChannel::Short).unwrap();
        assert!(close(long.integration_time, budget * 16.0 / 17.0));
        assert!(close(short.integration_time, budget / 17.0));
        assert!(close(long.gain, 0.32 / (budget * 16.0 / 17.0)));
        assert!(close(short.gain, 0.02 / (budget / 17.0)));
        assert!(d.allotted_time() <= budget * (1.0 + 1e-6));
    }

    #[test]
    fn two_channel_fits_without_gain() {
        let m = mode(&TWO, HdrTopology::Stitched{guard_lines: 10});
        let d = HdrDistributor::default().distribute(&m, 2.0, 0.001, &[16.0]).unwrap();
        assert!(!d.split);
        let long = d.target(ExposureChannel::Long).unwrap();
        let short = d.target(ExposureChannel::Short).unwrap();
        assert!(close(long.integration_time, 0.032));
        assert!(close(short.integration_time, 0.002));
        assert_eq!(long.gain, 1.0);
        assert_eq!(short.gain, 1.0);
    }

    #[test]
    fn three_channel_uses_second_ratio() {
        let m = mode(&THREE, HdrTopology::Stitched{guard_lines: 12});
        let d = HdrDistributor::default()
            .distribute(&m, 1.0, 0.0001, &[4.0, 8.0]).unwrap();
        assert!(!d.split);
        assert!(close(d.target(ExposureChannel::Long).unwrap().integration_time, 0.0032));
        assert!(close(d.target(ExposureChannel::Short).unwrap().integration_time, 0.0008));
        assert!(close(d.target(ExposureChannel::VeryShort).unwrap().integration_time, 0.0001));
    }

    #[test]
    fn capped_window_moves_exposure_into_gain() {
        let m = mode(&SHORT_VS, HdrTopology::Stitched{guard_lines: 12});
        let d = HdrDistributor::default()
            .distribute(&m, 1.0, 0.001, &[4.0, 4.0]).unwrap();
        assert!(!d.split);
        let cap = 8.0 * 0.000_063_06;
        let vs = d.target(ExposureChannel::VeryShort).unwrap();
        assert!(close(vs.integration_time, cap));
        assert!(close(vs.gain, 0.001 / cap));
        let long = d.target(ExposureChannel::Long).unwrap();
        assert!(close(long.integration_time, 0.016));
        assert_eq!(long.gain, 1.0);
    }

    #[test]
    fn capped_window_frees_budget_for_the_others() {
        let m = mode(&SHORT_VS, HdrTopology::Stitched{guard_lines: 12});
        let d = HdrDistributor::default()
            .distribute(&m, 1.0, 0.01, &[4.0, 4.0]).unwrap();
        assert!(d.split);
        let budget = m.time_budget();
        let cap = 8.0 * 0.000_063_06;
        let vs = d.target(ExposureChannel::VeryShort).unwrap();
        let long = d.target(ExposureChannel::Long).unwrap();
        let short = d.target(ExposureChannel::Short).unwrap();
        assert!(close(vs.integration_time, cap));
        assert!(close(long.integration_time, (budget - cap) * 16.0 / 20.0));
        assert!(close(short.integration_time, (budget - cap) * 4.0 / 20.0));
        for (t, weight) in [(vs, 1.0), (long, 16.0), (short, 4.0)] {
            assert!(close(t.gain * t.integration_time, 0.01 * weight), "{:?}", t);
        }
        assert!(d.allotted_time() <= budget * (1.0 + 1e-5));
    }

    #[test]
    fn zero_ratio_defaults_to_sixteen() {
        let m = mode(&TWO, HdrTopology::Stitched{guard_lines: 10});
        let d = HdrDistributor::default().distribute(&m, 1.0, 0.001, &[0.0]).unwrap();
        assert_eq!(d.ratios, vec![16.0]);
        let d = HdrDistributor::default().distribute(&m, 1.0, 0.001, &[]).unwrap();
        assert_eq!(d.ratios, vec![16.0]);
    }

    #[test]
    fn reject_policy_refuses_zero_ratio() {
        let m = mode(&TWO, HdrTopology::Stitched{guard_lines: 10});
        let err = HdrDistributor::new(RatioPolicy::Reject)
            .distribute(&m, 1.0, 0.001, &[0.0]).unwrap_err();
        assert!(matches!(err, IsiError::InvalidArgument(_)));
    }

    #[test]
    fn shared_window_differs_by_gain() {
        let m = mode(&DCG, HdrTopology::Native{guard_lines: 12});
        let d = HdrDistributor::default()
            .distribute(&m, 1.0, 0.001, &[4.0, 16.0]).unwrap();
        let hcg = d.target(ExposureChannel::Hcg).unwrap();
        let lcg = d.target(ExposureChannel::Lcg).unwrap();
        let vs = d.target(ExposureChannel::VeryShort).unwrap();
        assert_eq!(hcg.integration_time, lcg.integration_time);
        assert!(close(lcg.integration_time, 0.016));
        assert_eq!(lcg.gain, 1.0);
        assert_eq!(hcg.gain, 4.0);
        assert!(close(vs.integration_time, 0.001));
        assert!(close(d.allotted_time(), 0.017));
    }

    #[test]
    fn time_budget_invariant() {
        let budget_of = |m: &SensorMode| m.time_budget() * (1.0 + 1e-5);
        let modes = [mode(&TWO, HdrTopology::Stitched{guard_lines: 10}),
                     mode(&THREE, HdrTopology::Stitched{guard_lines: 12}),
                     mode(&SHORT_VS, HdrTopology::Stitched{guard_lines: 12}),
                     mode(&DCG, HdrTopology::Native{guard_lines: 12})];
        let distributor = HdrDistributor::default();
        for m in &modes {
            for gain in [1.0, 1.5, 4.0, 30.0] {
                for time in [0.0, 0.0001, 0.001, 0.01, 0.05, 0.5] {
                    for ratio in [1.0, 4.0, 16.0, 64.0] {
                        let d = distributor.distribute(m, gain, time, &[ratio, ratio]).unwrap();
                        assert!(d.allotted_time() <= budget_of(m),
                                "{:?} g={} t={} r={}", m.topology, gain, time, ratio);
                        // Exposure is never dropped: time * gain matches the target.
                        let e = gain * time;
                        let reference = d.targets.last().unwrap();
                        assert!((reference.gain * reference.integration_time - e).abs()
                                <= 1e-5 * e.max(1e-6));
                        for t in &d.targets {
                            let ws = m.channels.iter().find(|c| c.channel == t.channel)
                                .map(|c| c.max_lines as f32 * m.one_line_time).unwrap();
                            assert!(t.integration_time <= ws * (1.0 + 1e-6), "{:?}", t);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn linear_mode_not_supported() {
        static LINEAR: [ChannelSpec; 1] = [spec(ExposureChannel::Linear, 0)];
        let m = mode(&LINEAR, HdrTopology::Linear);
        assert!(matches!(HdrDistributor::default().distribute(&m, 1.0, 0.01, &[]),
                         Err(IsiError::NotSupported(_))));
    }
}
