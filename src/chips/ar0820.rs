// onsemi AR0820. 16-bit registers, up to three stitched exposures (T1, T2,
// T3). Gains are written before integration times on this part.

use crate::chip::{ChannelRegisters, ChipDescriptor, ChipId, ExposureRegister,
                  GainRegisters, GroupHold, WriteOrder};
use crate::gain_codec::{GainLaw, Rounding};
use crate::integration_codec::LineEncoding;
use crate::mode::{BayerPattern, ChannelSpec, ExposureChannel, FpsRange, GainBounds,
                  HdrTopology, ModeCatalog, SensorMode};
use crate::register_port::{reg, RegisterField};

use super::{bounds, channel, INDEXED_LADDER};

static GAIN_LAW: GainLaw = GainLaw::Ladder{
    steps: &INDEXED_LADDER,
    fine_scale: 512.0,
    fine_max: 1023.0 / 512.0,
    rounding: Rounding::Round,
};

const GAIN: GainBounds = bounds(1.0, 15.98, 1.0, 1.0 / 512.0);

static LINEAR_CHANNELS: [ChannelSpec; 1] = [
    channel(ExposureChannel::Linear, 0, GAIN, 1, 2250 - 4),
];

static HDR2_CHANNELS: [ChannelSpec; 2] = [
    channel(ExposureChannel::Long, 0, GAIN, 1, 2250 - 10),
    channel(ExposureChannel::Short, 1, GAIN, 1, 2250 - 10),
];

static HDR3_CHANNELS: [ChannelSpec; 3] = [
    channel(ExposureChannel::Long, 0, GAIN, 1, 2250 - 12),
    channel(ExposureChannel::Short, 1, GAIN, 1, 2250 - 12),
    channel(ExposureChannel::VeryShort, 2, GAIN, 1, 2250 - 12),
];

static MODES: [SensorMode; 3] = [
    SensorMode{
        index: 0, width: 3840, height: 2160, bit_width: 12,
        bayer: BayerPattern::Grbg,
        topology: HdrTopology::Linear,
        fps: FpsRange{min: 1.0, max: 30.0},
        one_line_time: 0.000_014_8,
        frame_length_lines: 2250,
        channels: &LINEAR_CHANNELS,
        init_sequence: &[reg(0x301a, 0x0059), reg(0x3082, 0x0001), reg(0x300a, 0x08ca)],
    },
    SensorMode{
        index: 1, width: 3840, height: 2160, bit_width: 16,
        bayer: BayerPattern::Grbg,
        topology: HdrTopology::Stitched{guard_lines: 10},
        fps: FpsRange{min: 1.0, max: 30.0},
        one_line_time: 0.000_014_8,
        frame_length_lines: 2250,
        channels: &HDR2_CHANNELS,
        init_sequence: &[reg(0x301a, 0x0059), reg(0x3082, 0x0004), reg(0x300a, 0x08ca)],
    },
    SensorMode{
        index: 2, width: 3840, height: 2160, bit_width: 20,
        bayer: BayerPattern::Grbg,
        topology: HdrTopology::Stitched{guard_lines: 12},
        fps: FpsRange{min: 1.0, max: 30.0},
        one_line_time: 0.000_014_8,
        frame_length_lines: 2250,
        channels: &HDR3_CHANNELS,
        init_sequence: &[reg(0x301a, 0x0059), reg(0x3082, 0x0008), reg(0x300a, 0x08ca)],
    },
];

static CHANNELS: [ChannelRegisters; 4] = [
    ChannelRegisters{
        channel: ExposureChannel::Linear,
        exposure: Some(ExposureRegister{field: RegisterField::word(0x3012),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::word(0x3366),
                            fine: Some(RegisterField::word(0x336a))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Long,
        exposure: Some(ExposureRegister{field: RegisterField::word(0x3012),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::word(0x3366),
                            fine: Some(RegisterField::word(0x336a))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Short,
        exposure: Some(ExposureRegister{field: RegisterField::word(0x3212),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::word(0x3368),
                            fine: Some(RegisterField::word(0x336c))},
    },
    ChannelRegisters{
        channel: ExposureChannel::VeryShort,
        exposure: Some(ExposureRegister{field: RegisterField::word(0x3216),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::word(0x336e),
                            fine: Some(RegisterField::word(0x3370))},
    },
];

pub static DESCRIPTOR: ChipDescriptor = ChipDescriptor{
    id: ChipId::Ar0820,
    model: "onsemi AR0820",
    chip_id_field: RegisterField::word(0x3000),
    chip_id_value: 0x0f56,
    modes: ModeCatalog::new(&MODES),
    channels: &CHANNELS,
    group_hold: GroupHold{begin: &[reg(0x3022, 0x0001)],
                          end: &[reg(0x3022, 0x0000)]},
    stream_on: &[reg(0x301a, 0x005c)],
    stream_off: &[reg(0x301a, 0x0058)],
    write_order: WriteOrder::GainFirst,
    exposure_latency: 2,
    readback: true,
};
