// Sony IMX681. SMIA register layout with reciprocal analog gain codes.
// Linear modes only.

use crate::chip::{ChannelRegisters, ChipDescriptor, ChipId, ExposureRegister,
                  GainRegisters, GroupHold, WriteOrder};
use crate::gain_codec::{GainLaw, Rounding};
use crate::integration_codec::LineEncoding;
use crate::mode::{BayerPattern, ChannelSpec, ExposureChannel, FpsRange, GainBounds,
                  HdrTopology, ModeCatalog, SensorMode};
use crate::register_port::{reg, RegisterField};

use super::{bounds, channel, SMIA_STREAM_OFF, SMIA_STREAM_ON};

static GAIN_LAW: GainLaw = GainLaw::Reciprocal{
    numerator: 1024.0,
    max_code: 960,
    rounding: Rounding::Truncate,
};

const GAIN: GainBounds = bounds(1.0, 16.0, 1.0 / 1024.0, 0.0);

static FULL_CHANNELS: [ChannelSpec; 1] = [
    channel(ExposureChannel::Linear, 0, GAIN, 8, 3100 - 22),
];

static BINNED_CHANNELS: [ChannelSpec; 1] = [
    channel(ExposureChannel::Linear, 0, GAIN, 8, 1600 - 22),
];

static MODES: [SensorMode; 2] = [
    SensorMode{
        index: 0, width: 4056, height: 3040, bit_width: 10,
        bayer: BayerPattern::Rggb,
        topology: HdrTopology::Linear,
        fps: FpsRange{min: 1.0, max: 30.0},
        one_line_time: 0.000_010_75,
        frame_length_lines: 3100,
        channels: &FULL_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x0340, 0x0c), reg(0x0341, 0x1c),
                         reg(0x0900, 0x00)],
    },
    SensorMode{
        index: 1, width: 2028, height: 1520, bit_width: 10,
        bayer: BayerPattern::Rggb,
        topology: HdrTopology::Linear,
        fps: FpsRange{min: 1.0, max: 60.0},
        one_line_time: 0.000_010_4,
        frame_length_lines: 1600,
        channels: &BINNED_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x0340, 0x06), reg(0x0341, 0x40),
                         reg(0x0900, 0x01), reg(0x0901, 0x22)],
    },
];

static CHANNELS: [ChannelRegisters; 1] = [
    ChannelRegisters{
        channel: ExposureChannel::Linear,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x0202, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x0204, 2, 10),
                            fine: None},
    },
];

pub static DESCRIPTOR: ChipDescriptor = ChipDescriptor{
    id: ChipId::Imx681,
    model: "Sony IMX681",
    chip_id_field: RegisterField::bytes(0x0016, 2, 16),
    chip_id_value: 0x0681,
    modes: ModeCatalog::new(&MODES),
    channels: &CHANNELS,
    group_hold: GroupHold{begin: &[reg(0x0104, 0x01)],
                          end: &[reg(0x0104, 0x00)]},
    stream_on: SMIA_STREAM_ON,
    stream_off: SMIA_STREAM_OFF,
    write_order: WriteOrder::ExposureFirst,
    exposure_latency: 2,
    readback: true,
};
