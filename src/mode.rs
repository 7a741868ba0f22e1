// Sensor mode descriptors and the per-chip mode catalog.

use std::fmt;

use serde::Serialize;

use crate::error::IsiError;
use crate::register_port::RegisterWrite;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum BayerPattern {
    Rggb, Grbg, Gbrg, Bggr,
}

/// One of the simultaneous exposure paths a sensor mode can expose.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ExposureChannel {
    Linear,
    Long,
    Short,
    VeryShort,
    /// High conversion gain readout of a dual-conversion-gain pixel.
    Hcg,
    /// Low conversion gain readout of a dual-conversion-gain pixel.
    Lcg,
}

impl fmt::Display for ExposureChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)  // Just re-use Debug.
    }
}

/// How the mode produces its exposures.
/// `guard_lines` is subtracted from the frame length to get the usable
/// integration budget shared by all HDR channels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum HdrTopology {
    Linear,
    /// The sensor combines its exposures internally.
    Native { guard_lines: u32 },
    /// The exposures are sent separately and stitched downstream.
    Stitched { guard_lines: u32 },
}

impl HdrTopology {
    pub fn guard_lines(&self) -> u32 {
        match self {
            HdrTopology::Linear => 0,
            HdrTopology::Native{guard_lines} |
            HdrTopology::Stitched{guard_lines} => *guard_lines,
        }
    }

    pub fn is_hdr(&self) -> bool {
        !matches!(self, HdrTopology::Linear)
    }
}

/// Gain limits of one channel, as total gain ratios (1.0 == unity).
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GainBounds {
    pub min: f32,
    pub max: f32,
    pub step_analog: f32,
    pub step_digital: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct FpsRange {
    pub min: f32,
    pub max: f32,
}

/// Per-channel limits within a mode.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ChannelSpec {
    pub channel: ExposureChannel,

    /// Channels with the same window id share one integration period.
    pub window: u8,

    pub gain: GainBounds,
    pub min_lines: u32,
    pub max_lines: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct SensorMode {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub bit_width: u8,
    pub bayer: BayerPattern,
    pub topology: HdrTopology,
    pub fps: FpsRange,

    /// Seconds per integration line.
    pub one_line_time: f32,
    pub frame_length_lines: u32,

    /// Channels in priority order: the first one is the primary (longest)
    /// exposure, `ratio[i]` relates channel `i` to channel `i + 1`.
    pub channels: &'static [ChannelSpec],

    /// Opaque register sequence selecting this mode.
    #[serde(skip)]
    pub init_sequence: &'static [RegisterWrite],
}

impl SensorMode {
    pub fn channel(&self, channel: ExposureChannel) -> Option<&ChannelSpec> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    pub fn has_channel(&self, channel: ExposureChannel) -> bool {
        self.channel(channel).is_some()
    }

    /// Number of HDR ratios `exposure_control` consumes for this mode.
    pub fn ratio_slots(&self) -> usize {
        self.channels.len().saturating_sub(1)
    }

    /// Integration time available to all windows together.
    pub fn time_budget(&self) -> f32 {
        let lines = self.frame_length_lines.saturating_sub(self.topology.guard_lines());
        lines as f32 * self.one_line_time
    }

    /// The channel whose exposure equals the AE request (the last one).
    pub fn reference_channel(&self) -> Option<&ChannelSpec> {
        self.channels.last()
    }
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "mode {}: {}x{} {}bit {:?} {:?} {:.0}fps",
               self.index, self.width, self.height, self.bit_width,
               self.bayer, self.topology, self.fps.max)
    }
}

/// Static, ordered list of the modes a chip supports.
#[derive(Copy, Clone, Debug)]
pub struct ModeCatalog {
    modes: &'static [SensorMode],
}

impl ModeCatalog {
    pub const fn new(modes: &'static [SensorMode]) -> Self {
        ModeCatalog{modes}
    }

    pub fn enumerate(&self, index: usize) -> Result<&'static SensorMode, IsiError> {
        self.modes.get(index).ok_or(IsiError::OutOfRange{index, len: self.modes.len()})
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static SensorMode> {
        self.modes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: GainBounds = GainBounds{min: 1.0, max: 16.0,
                                          step_analog: 1.0 / 16.0,
                                          step_digital: 1.0 / 256.0};
    static CHANNELS: [ChannelSpec; 2] = [
        ChannelSpec{channel: ExposureChannel::Long, window: 0, gain: BOUNDS,
                    min_lines: 2, max_lines: 1240},
        ChannelSpec{channel: ExposureChannel::Short, window: 1, gain: BOUNDS,
                    min_lines: 1, max_lines: 100},
    ];
    static MODES: [SensorMode; 1] = [SensorMode{
        index: 0, width: 1920, height: 1080, bit_width: 12,
        bayer: BayerPattern::Bggr,
        topology: HdrTopology::Stitched{guard_lines: 10},
        fps: FpsRange{min: 1.0, max: 30.0},
        one_line_time: 0.000_063_06,
        frame_length_lines: 1250,
        channels: &CHANNELS,
        init_sequence: &[],
    }];

    #[test]
    fn enumerate_past_end() {
        let catalog = ModeCatalog::new(&MODES);
        assert_eq!(catalog.enumerate(0).unwrap().width, 1920);
        assert_eq!(catalog.enumerate(1).unwrap_err(),
                   IsiError::OutOfRange{index: 1, len: 1});
    }

    #[test]
    fn budget_subtracts_guard_lines() {
        let mode = &MODES[0];
        let expected = 1240.0 * 0.000_063_06;
        assert!((mode.time_budget() - expected).abs() < 1e-6);
        assert_eq!(mode.ratio_slots(), 1);
        assert_eq!(mode.reference_channel().unwrap().channel, ExposureChannel::Short);
    }

    #[test]
    fn channel_lookup() {
        let mode = &MODES[0];
        assert!(mode.has_channel(ExposureChannel::Long));
        assert!(!mode.has_channel(ExposureChannel::Hcg));
    }
}
