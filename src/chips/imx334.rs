// Sony IMX334. Little endian byte registers, gain in 0.3 dB steps and the
// integration time programmed as a shutter line counted from the frame end.

use crate::chip::{ChannelRegisters, ChipDescriptor, ChipId, ExposureRegister,
                  GainRegisters, GroupHold, WriteOrder};
use crate::gain_codec::{GainLaw, Rounding};
use crate::integration_codec::LineEncoding;
use crate::mode::{BayerPattern, ChannelSpec, ExposureChannel, FpsRange, GainBounds,
                  HdrTopology, ModeCatalog, SensorMode};
use crate::register_port::{reg, RegisterField};

use super::{bounds, channel};

// 30 dB analog plus 42 dB digital, 0.3 dB per code.
static GAIN_LAW: GainLaw = GainLaw::Decibel{
    step_db: 0.3,
    max_code: 240,
    rounding: Rounding::Round,
};

const GAIN: GainBounds = bounds(1.0, 3981.0, 0.035, 0.0);

static LINEAR_CHANNELS: [ChannelSpec; 1] = [
    channel(ExposureChannel::Linear, 0, GAIN, 1, 2250 - 5),
];

static DOL_CHANNELS: [ChannelSpec; 2] = [
    channel(ExposureChannel::Long, 0, GAIN, 1, 4500 - 10),
    channel(ExposureChannel::Short, 1, GAIN, 1, 4500 - 10),
];

static MODES: [SensorMode; 2] = [
    SensorMode{
        index: 0, width: 3840, height: 2160, bit_width: 12,
        bayer: BayerPattern::Rggb,
        topology: HdrTopology::Linear,
        fps: FpsRange{min: 1.0, max: 30.0},
        one_line_time: 0.000_014_8,
        frame_length_lines: 2250,
        channels: &LINEAR_CHANNELS,
        init_sequence: &[reg(0x3000, 0x01), reg(0x3030, 0xca), reg(0x3031, 0x08),
                         reg(0x3048, 0x00)],
    },
    SensorMode{
        index: 1, width: 3840, height: 2160, bit_width: 10,
        bayer: BayerPattern::Rggb,
        topology: HdrTopology::Stitched{guard_lines: 10},
        fps: FpsRange{min: 1.0, max: 15.0},
        one_line_time: 0.000_014_8,
        frame_length_lines: 4500,
        channels: &DOL_CHANNELS,
        init_sequence: &[reg(0x3000, 0x01), reg(0x3030, 0x94), reg(0x3031, 0x11),
                         reg(0x3048, 0x01), reg(0x3049, 0x01)],
    },
];

static CHANNELS: [ChannelRegisters; 3] = [
    ChannelRegisters{
        channel: ExposureChannel::Linear,
        exposure: Some(ExposureRegister{field: RegisterField::bytes_le(0x3058, 3, 20),
                                        encoding: LineEncoding::FromFrameEnd, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes_le(0x30e8, 2, 11),
                            fine: None},
    },
    ChannelRegisters{
        channel: ExposureChannel::Long,
        exposure: Some(ExposureRegister{field: RegisterField::bytes_le(0x3058, 3, 20),
                                        encoding: LineEncoding::FromFrameEnd, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes_le(0x30e8, 2, 11),
                            fine: None},
    },
    ChannelRegisters{
        channel: ExposureChannel::Short,
        exposure: Some(ExposureRegister{field: RegisterField::bytes_le(0x305c, 3, 20),
                                        encoding: LineEncoding::FromFrameEnd, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes_le(0x30ea, 2, 11),
                            fine: None},
    },
];

pub static DESCRIPTOR: ChipDescriptor = ChipDescriptor{
    id: ChipId::Imx334,
    model: "Sony IMX334",
    chip_id_field: RegisterField::bytes_le(0x3f12, 2, 16),
    chip_id_value: 0x0334,
    modes: ModeCatalog::new(&MODES),
    channels: &CHANNELS,
    group_hold: GroupHold{begin: &[reg(0x3001, 0x01)],
                          end: &[reg(0x3001, 0x00)]},
    stream_on: &[reg(0x3000, 0x00), reg(0x3002, 0x00)],
    stream_off: &[reg(0x3000, 0x01), reg(0x3002, 0x01)],
    write_order: WriteOrder::ExposureFirst,
    exposure_latency: 2,
    readback: true,
};
