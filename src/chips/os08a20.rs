// OmniVision OS08A20. Byte registers, Q4.10 fine gain with rounding,
// linear and two-exposure stitched HDR.

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
    fine_scale: 1024.0,
    fine_max: 2047.0 / 1024.0,
    rounding: Rounding::Round,
};

const GAIN: GainBounds = bounds(1.0, 15.99, 1.0, 1.0 / 1024.0);

static LINEAR_CHANNELS: [ChannelSpec; 1] = [
    channel(ExposureChannel::Linear, 0, GAIN, 8, 0x486 - 8),
];

static HDR_CHANNELS: [ChannelSpec; 2] = [
    channel(ExposureChannel::Long, 0, GAIN, 2, 0x4e2 - 14),
    channel(ExposureChannel::Short, 1, GAIN, 1, 0x4e2 - 14),
];

static MODES: [SensorMode; 2] = [
    SensorMode{
        index: 0, width: 1920, height: 1080, bit_width: 12,
        bayer: BayerPattern::Bggr,
        topology: HdrTopology::Linear,
        fps: FpsRange{min: 5.0, max: 24.0},
        one_line_time: 0.000_036,
        frame_length_lines: 0x486,
        channels: &LINEAR_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x3501, 0x04), reg(0x380e, 0x04),
                         reg(0x380f, 0x86), reg(0x3821, 0x04)],
    },
    SensorMode{
        index: 1, width: 1920, height: 1080, bit_width: 10,
        bayer: BayerPattern::Bggr,
        topology: HdrTopology::Stitched{guard_lines: 10},
        fps: FpsRange{min: 5.0, max: 12.7},
        one_line_time: 0.000_063_06,
        frame_length_lines: 0x4e2,
        channels: &HDR_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x380e, 0x04), reg(0x380f, 0xe2),
                         reg(0x3821, 0x24), reg(0x3827, 0x00)],
    },
];

static CHANNELS: [ChannelRegisters; 3] = [
    ChannelRegisters{
        channel: ExposureChannel::Linear,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x3501, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x3508, 1, 3),
                            fine: Some(RegisterField::bytes(0x350a, 2, 11))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Long,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x3501, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x3508, 1, 3),
                            fine: Some(RegisterField::bytes(0x350a, 2, 11))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Short,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x3511, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x350c, 1, 3),
                            fine: Some(RegisterField::bytes(0x350e, 2, 11))},
    },
];

pub static DESCRIPTOR: ChipDescriptor = ChipDescriptor{
    id: ChipId::Os08a20,
    model: "OmniVision OS08A20",
    chip_id_field: RegisterField::bytes(0x300a, 3, 24),
    chip_id_value: 0x530841,
    modes: ModeCatalog::new(&MODES),
    channels: &CHANNELS,
    group_hold: OMNIVISION_GROUP_HOLD,
    stream_on: SMIA_STREAM_ON,
    stream_off: SMIA_STREAM_OFF,
    write_order: WriteOrder::ExposureFirst,
    exposure_latency: 1,
    readback: true,
};
