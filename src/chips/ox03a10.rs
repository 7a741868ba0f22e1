// OmniVision OX03A10. Native HDR with a dual conversion gain window and a
// very short exposure. Q4.10 fine gain, truncated. Gain registers are write
// only on this part, so the session starts from the mode minimum.

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
    rounding: Rounding::Truncate,
};

const GAIN: GainBounds = bounds(1.0, 15.99, 1.0, 1.0 / 1024.0);

static DCG_VS_CHANNELS: [ChannelSpec; 3] = [
    channel(ExposureChannel::Hcg, 0, GAIN, 2, 1370 - 12),
    channel(ExposureChannel::Lcg, 0, GAIN, 2, 1370 - 12),
    channel(ExposureChannel::VeryShort, 1, GAIN, 1, 32),
];

static DCG_CHANNELS: [ChannelSpec; 2] = [
    channel(ExposureChannel::Hcg, 0, GAIN, 2, 1370 - 10),
    channel(ExposureChannel::Lcg, 0, GAIN, 2, 1370 - 10),
];

static MODES: [SensorMode; 2] = [
    SensorMode{
        index: 0, width: 1920, height: 1280, bit_width: 12,
        bayer: BayerPattern::Grbg,
        topology: HdrTopology::Native{guard_lines: 12},
        fps: FpsRange{min: 5.0, max: 30.0},
        one_line_time: 0.000_024_3,
        frame_length_lines: 1370,
        channels: &DCG_VS_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x3018, 0x3a), reg(0x380e, 0x05),
                         reg(0x380f, 0x5a)],
    },
    SensorMode{
        index: 1, width: 1920, height: 1280, bit_width: 12,
        bayer: BayerPattern::Grbg,
        topology: HdrTopology::Native{guard_lines: 10},
        fps: FpsRange{min: 5.0, max: 30.0},
        one_line_time: 0.000_024_3,
        frame_length_lines: 1370,
        channels: &DCG_CHANNELS,
        init_sequence: &[reg(0x0103, 0x01), reg(0x3018, 0x32), reg(0x380e, 0x05),
                         reg(0x380f, 0x5a)],
    },
];

static CHANNELS: [ChannelRegisters; 3] = [
    ChannelRegisters{
        channel: ExposureChannel::Hcg,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x3501, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x3508, 1, 3),
                            fine: Some(RegisterField::bytes(0x350a, 2, 11))},
    },
    ChannelRegisters{
        channel: ExposureChannel::Lcg,
        exposure: None,
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x3548, 1, 3),
                            fine: Some(RegisterField::bytes(0x354a, 2, 11))},
    },
    ChannelRegisters{
        channel: ExposureChannel::VeryShort,
        exposure: Some(ExposureRegister{field: RegisterField::bytes(0x3581, 2, 16),
                                        encoding: LineEncoding::Direct, sub_line: 1}),
        gain: GainRegisters{law: &GAIN_LAW,
                            coarse: RegisterField::bytes(0x3588, 1, 3),
                            fine: Some(RegisterField::bytes(0x358a, 2, 11))},
    },
];

pub static DESCRIPTOR: ChipDescriptor = ChipDescriptor{
    id: ChipId::Ox03a10,
    model: "OmniVision OX03A10",
    chip_id_field: RegisterField::bytes(0x300a, 3, 24),
    chip_id_value: 0x580358,
    modes: ModeCatalog::new(&MODES),
    channels: &CHANNELS,
    group_hold: OMNIVISION_GROUP_HOLD,
    stream_on: SMIA_STREAM_ON,
    stream_off: SMIA_STREAM_OFF,
    write_order: WriteOrder::ExposureFirst,
    exposure_latency: 1,
    readback: false,
};
