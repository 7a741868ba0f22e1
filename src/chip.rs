// Per-chip description consumed by the generic exposure engine. Everything
// that differs between sensors of the family lives here as data: register
// addresses, gain law, rounding, exposure latency, hold and stream sequences,
// and the mode catalog.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::gain_codec::GainLaw;
use crate::integration_codec::LineEncoding;
use crate::mode::{ExposureChannel, ModeCatalog};
use crate::register_port::{RegisterField, RegisterWrite};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ChipId {
    Ar0820,
    Imx334,
    Imx681,
    Os02k10,
    Os08a20,
    Ov10652,
    Ov2775,
    Ox03a10,
}

impl ChipId {
    pub const ALL: [ChipId; 8] = [
        ChipId::Ar0820, ChipId::Imx334, ChipId::Imx681, ChipId::Os02k10,
        ChipId::Os08a20, ChipId::Ov10652, ChipId::Ov2775, ChipId::Ox03a10,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChipId::Ar0820 => "ar0820",
            ChipId::Imx334 => "imx334",
            ChipId::Imx681 => "imx681",
            ChipId::Os02k10 => "os02k10",
            ChipId::Os08a20 => "os08a20",
            ChipId::Ov10652 => "ov10652",
            ChipId::Ov2775 => "ov2775",
            ChipId::Ox03a10 => "ox03a10",
        }
    }
}

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ChipId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        // The OS02C10 shares the OS02K10 register map.
        if lower == "os02c10" {
            return Ok(ChipId::Os02k10);
        }
        ChipId::ALL.iter().find(|c| c.name() == lower).copied()
            .ok_or_else(|| format!("unknown sensor chip '{}'", s))
    }
}

/// Where a channel's integration time is stored.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ExposureRegister {
    pub field: RegisterField,
    pub encoding: LineEncoding,
    /// Codes per line; 1 unless the register holds fractional lines.
    pub sub_line: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GainRegisters {
    pub law: &'static GainLaw,
    pub coarse: RegisterField,
    /// Absent for laws with no separate fine code.
    pub fine: Option<RegisterField>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ChannelRegisters {
    pub channel: ExposureChannel,
    /// None when the channel shares its window's exposure register with an
    /// earlier channel.
    pub exposure: Option<ExposureRegister>,
    pub gain: GainRegisters,
}

/// Order of the writes that make up one channel update.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum WriteOrder {
    /// Exposure lines, then coarse gain, then fine gain.
    ExposureFirst,
    /// Coarse gain, fine gain, then exposure lines.
    GainFirst,
}

/// Register sequences that bracket a multi-register update so the sensor
/// latches it on one frame boundary.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GroupHold {
    pub begin: &'static [RegisterWrite],
    pub end: &'static [RegisterWrite],
}

#[derive(Copy, Clone, Debug)]
pub struct ChipDescriptor {
    pub id: ChipId,
    pub model: &'static str,

    /// Chip id register and the value a genuine part reports.
    pub chip_id_field: RegisterField,
    pub chip_id_value: u32,

    pub modes: ModeCatalog,
    pub channels: &'static [ChannelRegisters],
    pub group_hold: GroupHold,
    pub stream_on: &'static [RegisterWrite],
    pub stream_off: &'static [RegisterWrite],
    pub write_order: WriteOrder,

    /// Frames before a new integration time shows in the output.
    pub exposure_latency: u8,
    /// Whether gain/exposure registers can be read back at mode setup.
    pub readback: bool,
}

impl ChipDescriptor {
    pub fn channel_registers(&self, channel: ExposureChannel) -> Option<&'static ChannelRegisters> {
        self.channels.iter().find(|c| c.channel == channel)
    }
}
