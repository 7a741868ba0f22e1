// OmniVision OV2775. Dual conversion gain pixel: HCG and LCG share one
// integration window, plus a separate very short exposure. Q8.8 fine gain.

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
    fine_max: 4095.0 / 256.0,
    rounding: Rounding::Round,
};

const HCG_GAIN: GainBounds = bounds(1.0, 120.0, 1.0, 1.0 / 256.0);
const LCG_GAIN: GainBounds = bounds(1.0, 120.0, 1.0, 1.0 / 256.0);
const VS_GAIN: GainBounds = bounds(1.0, 32.0, 1.0, 1.0 / 256.0);

static DCG_VS_CHANNELS: [ChannelSpec; 3] = [
    channel(ExposureChannel::Hcg, 0, HCG_GAIN, 2, 0x466 - 12),
    channel(ExposureChannel::Lcg, 0, LCG_GAIN, 2, 0x466 - 12),
    channel(ExposureChannel::VeryShort, 1, VS_GAIN, 1, 64),
];

static DCG_CHANNELS: [ChannelSpec; 2] = [
    channel(ExposureChannel::Hcg, 0, HCG_GAIN, 2, 0x466 - 10),
    channel(ExposureChannel::Lcg, 0, LCG_GAIN, 2, 0x466 - 10),
];

static LINEAR_CHANNELS: [ChannelSpec; 1] = [
    channel(ExposureChannel::Linear, 0, HCG_GAIN, 2, 0x466 - 8),
];

static MODES: [SensorMode; 3] = [
    SensorMode{
        index: 0, width: 1920, height: 1080, bit_width: 12,
        bayer: BayerPattern::Bggr,
        topology: HdrTopology::Native{guard_lines: 12},
        fps: FpsRange{min: 5.0, max: 30.0},
        one_line_time: 0.000_029_6,
        frame_length_lines: 0x466,
        channels: &DCG_VS_CHANNELS,
        init_sequence: &[reg(0x3013, 0x01), reg(0x3190, 0x08), reg(0x3280, 0x03)],
    },
    SensorMode{
        index: 1, width: 1920, height: 1080, bit_width: 12,
        bayer: BayerPattern::Bggr,
        topology: HdrTopology::Native{guard_lines: 10},
        fps: FpsRange{min: 5.0, max: 30.0},
        one_line_time: 0.000_029_6,
        frame_length_lines: 0x466,
        channels: &DCG_CHANNELS,
        init_sequence: &[reg(0x3013, 0x01), reg(0x3190, 0x08), reg(0x3280, 0x01)],
    },
    SensorMode{
        index: 2, width: 1920, height: 1080, bit_width: 12,
        bayer: BayerPattern::Bggr,
        topology: HdrTopology::Linear,
        fps: FpsRange{min: 5.0, max: 30.0},
        one_line_time: 0.000_029_6,
        frame_length_lines: 0x466,
        channels: &LINEAR_CHANNELS,
        init_sequence: &[reg(0x3013, 0x01), reg(0x3190, 0x00), reg(0x3280, 0x00)],
    },
];

static CHANNELS: [ChannelRegisters; 4] = [
    ChannelRegisters{
        channel: ExposureChannel::Linear,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x30b6, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x30bb, 1, 2),
                            fine: Some(RegisterField::bytes(0x315a, 2, 12))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Hcg,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x30b6, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x30bb, 1, 2),
                            fine: Some(RegisterField::bytes(0x315a, 2, 12))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Lcg,
        exposure: None,
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x30bc, 1, 2),
                            fine: Some(RegisterField::bytes(0x315c, 2, 12))},
    },
    ChannelRegisters{
        channel: ExposureChannel::VeryShort,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x30b8, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x30bd, 1, 2),
                            fine: Some(RegisterField::bytes(0x315e, 2, 12))},
    },
];

pub static DESCRIPTOR: ChipDescriptor = ChipDescriptor{
    id: ChipId::Ov2775,
    model: "OmniVision OV2775",
    chip_id_field: RegisterField::bytes(0x300a, 2, 16),
    chip_id_value: 0x2770,
    modes: ModeCatalog::new(&MODES),
    channels: &CHANNELS,
    group_hold: GroupHold{begin: &[reg(0x3467, 0x00), reg(0x3464, 0x04)],
                          end: &[reg(0x3464, 0x14), reg(0x3467, 0x01)]},
    stream_on: SMIA_STREAM_ON,
    stream_off: SMIA_STREAM_OFF,
    write_order: WriteOrder::ExposureFirst,
    exposure_latency: 1,
    readback: true,
};
