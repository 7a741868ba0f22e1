// OmniVision OS02K10 (and the register compatible OS02C10). Q1.4 fine gain,
// truncated.

use crate::chip::{ChannelRegisters, ChipDescriptor, ChipId, ExposureRegister,
                  GainRegisters, WriteOrder};
use crate::gain_codec::{GainLaw, Rounding};
use crate::integration_codec::LineEncoding;
use crate::mode::{BayerPattern, ChannelSpec, ExposureChannel, FpsRange, GainBounds,
                  HdrTopology, ModeCatalog, SensorMode};
use crate::register_port::{reg, RegisterField};

use super::{bounds, channel, OMNIVISION_GROUP_HOLD, OMNIVISION_LADDER, SMIA_STREAM_OFF,
            SMIA_STREAM_ON};

static GAIN_LAW: GainLaw = GainLaw::Ladder{
    steps: &OMNIVISION_LADDER,
    fine_scale: 16.0,
    fine_max: 31.0 / 16.0,
    rounding: Rounding::Truncate,
};

const GAIN: GainBounds = bounds(1.0, 15.5, 1.0, 1.0 / 16.0);

static LINEAR_CHANNELS: [ChannelSpec; 1] = [
    channel(ExposureChannel::Linear, 0, GAIN, 4, 1125 - 8),
];

static HDR_CHANNELS: [ChannelSpec; 2] = [
    channel(ExposureChannel::Long, 0, GAIN, 2, 2250 - 10),
    channel(ExposureChannel::Short, 1, GAIN, 1, 2250 - 10),
];

static MODES: [SensorMode; 2] = [
    SensorMode{
        index: 0, width: 1920, height: 1080, bit_width: 12,
        bayer: BayerPattern::Grbg,
        topology: HdrTopology::Linear,
        fps: FpsRange{min: 1.0, max: 30.0},
        one_line_time: 0.000_029_6,
        frame_length_lines: 1125,
        channels: &LINEAR_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x380e, 0x04), reg(0x380f, 0x65)],
    },
    SensorMode{
        index: 1, width: 1920, height: 1080, bit_width: 10,
        bayer: BayerPattern::Grbg,
        topology: HdrTopology::Stitched{guard_lines: 10},
        fps: FpsRange{min: 1.0, max: 30.0},
        one_line_time: 0.000_014_8,
        frame_length_lines: 2250,
        channels: &HDR_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x380e, 0x08), reg(0x380f, 0xca),
                         reg(0x3820, 0x01)],
    },
];

static CHANNELS: [ChannelRegisters; 3] = [
    ChannelRegisters{
        channel: ExposureChannel::Linear,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x3501, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x3508, 1, 4),
                            fine: Some(RegisterField::bytes(0x3509, 1, 8))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Long,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x3501, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x3508, 1, 4),
                            fine: Some(RegisterField::bytes(0x3509, 1, 8))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Short,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x3541, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x3548, 1, 4),
                            fine: Some(RegisterField::bytes(0x3549, 1, 8))},
    },
];

pub static DESCRIPTOR: ChipDescriptor = ChipDescriptor{
    id: ChipId::Os02k10,
    model: "OmniVision OS02K10",
    chip_id_field: RegisterField::bytes(0x300a, 3, 24),
    chip_id_value: 0x530243,
    modes: ModeCatalog::new(&MODES),
    channels: &CHANNELS,
    group_hold: OMNIVISION_GROUP_HOLD,
    stream_on: SMIA_STREAM_ON,
    stream_off: SMIA_STREAM_OFF,
    write_order: WriteOrder::ExposureFirst,
    exposure_latency: 1,
    readback: true,
};
