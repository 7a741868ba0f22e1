// Chip tables. Each submodule holds nothing but data: the register map, gain
// law and mode catalog of one sensor.

use crate::chip::{ChipDescriptor, ChipId, GroupHold};
use crate::gain_codec::CoarseStep;
use crate::mode::{ChannelSpec, ExposureChannel, GainBounds};
use crate::register_port::{reg, RegisterWrite};

pub mod ar0820;
pub mod imx334;
pub mod imx681;
pub mod os02k10;
pub mod os08a20;
pub mod ov10652;
pub mod ov2775;
pub mod ox03a10;

pub fn descriptor(id: ChipId) -> &'static ChipDescriptor {
    match id {
        ChipId::Ar0820 => &ar0820::DESCRIPTOR,
        ChipId::Imx334 => &imx334::DESCRIPTOR,
        ChipId::Imx681 => &imx681::DESCRIPTOR,
        ChipId::Os02k10 => &os02k10::DESCRIPTOR,
        ChipId::Os08a20 => &os08a20::DESCRIPTOR,
        ChipId::Ov10652 => &ov10652::DESCRIPTOR,
        ChipId::Ov2775 => &ov2775::DESCRIPTOR,
        ChipId::Ox03a10 => &ox03a10::DESCRIPTOR,
    }
}

pub fn all() -> impl Iterator<Item = &'static ChipDescriptor> {
    ChipId::ALL.into_iter().map(descriptor)
}

// Doubling ladder with the thermometer coarse codes OmniVision uses.
pub(crate) static OMNIVISION_LADDER: [CoarseStep; 4] = [
    CoarseStep{multiplier: 1.0, code: 0x0},
    CoarseStep{multiplier: 2.0, code: 0x1},
    CoarseStep{multiplier: 4.0, code: 0x3},
    CoarseStep{multiplier: 8.0, code: 0x7},
];

// Doubling ladder indexed by rung.
pub(crate) static INDEXED_LADDER: [CoarseStep; 4] = [
    CoarseStep{multiplier: 1.0, code: 0},
    CoarseStep{multiplier: 2.0, code: 1},
    CoarseStep{multiplier: 4.0, code: 2},
    CoarseStep{multiplier: 8.0, code: 3},
];

pub(crate) const OMNIVISION_GROUP_HOLD: GroupHold = GroupHold{
    begin: &[reg(0x3208, 0x00)],
    end: &[reg(0x3208, 0x10), reg(0x3208, 0xa0)],
};

pub(crate) const SMIA_STREAM_ON: &[RegisterWrite] = &[reg(0x0100, 0x01)];
pub(crate) const SMIA_STREAM_OFF: &[RegisterWrite] = &[reg(0x0100, 0x00)];

pub(crate) const fn bounds(min: f32, max: f32, step_analog: f32, step_digital: f32)
                           -> GainBounds {
    GainBounds{min, max, step_analog, step_digital}
}

pub(crate) const fn channel(channel: ExposureChannel, window: u8, gain: GainBounds,
                            min_lines: u32, max_lines: u32) -> ChannelSpec {
    ChannelSpec{channel, window, gain, min_lines, max_lines}
}
