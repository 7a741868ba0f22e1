// OmniVision OV10652. Three stitched exposures; the very short exposure is
// programmed in 1/32 line units. Q8.8 fine gain, truncated.

use crate::chip::{ChannelRegisters, ChipDescriptor, ChipId, ExposureRegister,
                  GainRegisters, GroupHold, WriteOrder};
use crate::gain_codec::{GainLaw, Rounding};
use crate::integration_codec::LineEncoding;
use crate::mode::{BayerPattern, ChannelSpec, ExposureChannel, FpsRange, GainBounds,
                  HdrTopology, ModeCatalog, SensorMode};
use crate::register_port::{reg, RegisterField};

use super::{bounds, channel, INDEXED_LADDER, SMIA_STREAM_OFF, SMIA_STREAM_ON};

static GAIN_LAW: GainLaw = GainLaw::Ladder{
    steps: &INDEXED_LADDER,
    fine_scale: 256.0,
    fine_max: 511.0 / 256.0,
    rounding: Rounding::Truncate,
};

const GAIN: GainBounds = bounds(1.0, 15.9, 1.0, 1.0 / 256.0);

static HDR_CHANNELS: [ChannelSpec; 3] = [
    channel(ExposureChannel::Long, 0, GAIN, 2, 1140 - 12),
    channel(ExposureChannel::Short, 1, GAIN, 1, 1140 - 12),
    channel(ExposureChannel::VeryShort, 2, GAIN, 1, 8),
];

static LINEAR_CHANNELS: [ChannelSpec; 1] = [
    channel(ExposureChannel::Linear, 0, GAIN, 2, 1140 - 8),
];

static MODES: [SensorMode; 2] = [
    SensorMode{
        index: 0, width: 1280, height: 1080, bit_width: 12,
        bayer: BayerPattern::Bggr,
        topology: HdrTopology::Stitched{guard_lines: 12},
        fps: FpsRange{min: 5.0, max: 30.0},
        one_line_time: 0.000_029_2,
        frame_length_lines: 1140,
        channels: &HDR_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x3090, 0x04), reg(0x3119, 0x44),
                         reg(0x380e, 0x04), reg(0x380f, 0x74)],
    },
    SensorMode{
        index: 1, width: 1280, height: 1080, bit_width: 12,
        bayer: BayerPattern::Bggr,
        topology: HdrTopology::Linear,
        fps: FpsRange{min: 5.0, max: 30.0},
        one_line_time: 0.000_029_2,
        frame_length_lines: 1140,
        channels: &LINEAR_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x3090, 0x01), reg(0x3119, 0x40),
                         reg(0x380e, 0x04), reg(0x380f, 0x74)],
    },
];

static CHANNELS: [ChannelRegisters; 4] = [
    ChannelRegisters{
        channel: ExposureChannel::Linear,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x30e6, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x30ec, 1, 2),
                            fine: Some(RegisterField::bytes(0x30f0, 2, 10))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Long,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x30e6, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x30ec, 1, 2),
                            fine: Some(RegisterField::bytes(0x30f0, 2, 10))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Short,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x30e8, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x30ed, 1, 2),
                            fine: Some(RegisterField::bytes(0x30f2, 2, 10))},
    },
    ChannelRegisters{
        channel: ExposureChannel::VeryShort,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x30ea, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 32}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x30ee, 1, 2),
                            fine: Some(RegisterField::bytes(0x30f4, 2, 10))},
    },
];

pub static DESCRIPTOR: ChipDescriptor = ChipDescriptor{
    id: ChipId::Ov10652,
    model: "OmniVision OV10652",
    chip_id_field: RegisterField::bytes(0x300a, 2, 16),
    chip_id_value: 0xa652,
    modes: ModeCatalog::new(&MODES),
    channels: &CHANNELS,
    group_hold: GroupHold{begin: &[reg(0x302c, 0x01)],
                          end: &[reg(0x302c, 0x00)]},
    stream_on: SMIA_STREAM_ON,
    stream_off: SMIA_STREAM_OFF,
    write_order: WriteOrder::ExposureFirst,
    exposure_latency: 2,
    readback: true,
};
