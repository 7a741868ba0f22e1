// Per-mode exposure state and the AEC primitives built on the codecs and the
// HDR distributor.
//
// The controller remembers, per channel, both the value it last applied and
// the register codes it last wrote. A request whose quantized codes equal
// the written ones costs no bus traffic at all; when anything changed, every
// write of the call is bracketed by the chip's group-hold sequence so the
// sensor latches the whole update on one frame boundary.

use log::{debug, info, warn};
use serde::Serialize;

use crate::chip::{ChannelRegisters, ChipDescriptor, WriteOrder};
use crate::error::{IsiError, RegisterAccessError};
use crate::gain_codec::{GainCode, GainCodec, GainRange};
use crate::hdr_distributor::{HdrDistributor, RatioPolicy, DEFAULT_HDR_RATIO};
use crate::integration_codec::{IntegrationCode, IntegrationCodec};
use crate::mode::{ChannelSpec, ExposureChannel, HdrTopology, SensorMode};
use crate::register_port::{read_field, write_field, write_sequence, RegisterPort};

/// Gain currently applied to a channel. `gain` is always the decoded value of
/// the two codes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GainState {
    pub analog_code: u16,
    pub digital_code: u16,
    pub gain: f32,
}

impl From<GainCode> for GainState {
    fn from(code: GainCode) -> Self {
        GainState{analog_code: code.analog_code, digital_code: code.digital_code,
                  gain: code.gain}
    }
}

/// Integration time currently applied to a channel, in sub-line units.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct IntegrationState {
    pub line_code: u32,
    pub time: f32,
}

impl From<IntegrationCode> for IntegrationState {
    fn from(code: IntegrationCode) -> Self {
        IntegrationState{line_code: code.line_code, time: code.time}
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Limits {
    pub min: f32,
    pub max: f32,
}

/// Per-channel part of `AeBaseInfo`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelInfo {
    pub channel: ExposureChannel,
    pub gain: Limits,
    pub int_time: Limits,
    pub current_gain: f32,
    pub current_int_time: f32,
}

/// Snapshot handed to the upstream AE algorithm once per cycle. Top-level
/// limits and current values are those of the reference channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AeBaseInfo {
    pub gain: Limits,
    pub int_time: Limits,
    pub a_gain: GainRange,
    pub d_gain: GainRange,
    pub current_gain: f32,
    pub current_int_time: f32,
    pub stitching_mode: bool,
    pub native_mode: bool,
    /// Exposure ratio between consecutive channels as currently applied.
    pub native_hdr_ratio: Vec<f32>,
    pub channels: Vec<ChannelInfo>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ExposureResult {
    pub gain: f32,
    pub integration_time: f32,
    pub frames_to_skip: u8,
}

struct ChannelState {
    spec: &'static ChannelSpec,
    regs: &'static ChannelRegisters,
    gain_codec: GainCodec,
    int_codec: IntegrationCodec,

    // Index of the channel owning this channel's exposure register.
    owner: usize,

    gain: GainState,
    integration: IntegrationState,

    // Codes known to be in the sensor registers; None until the first write
    // when readback was unavailable.
    written_gain: Option<(u16, u16)>,
    written_lines: Option<u32>,
}

impl ChannelState {
    fn encode_gain(&self, gain: f32) -> GainCode {
        self.gain_codec.encode(self.spec.gain.min, self.spec.gain.max, gain)
    }
}

// Pending change for one channel.
#[derive(Default)]
struct Update {
    lines: Option<IntegrationCode>,
    gain: Option<GainCode>,
}

pub struct ExposureController {
    chip: &'static ChipDescriptor,
    mode: &'static SensorMode,
    distributor: HdrDistributor,
    channels: Vec<ChannelState>,
    ratios: Vec<f32>,
}

impl ExposureController {
    /// Builds the channel states for `mode` and seeds them from the sensor's
    /// current register contents, so the first AE request does not cause a
    /// spurious jump. Channels whose registers cannot be read back, or read
    /// back as codes this chip never produces, start at the mode minimum.
    pub fn initialize_from_mode<P: RegisterPort + ?Sized>(
        port: &mut P, chip: &'static ChipDescriptor, mode: &'static SensorMode,
        policy: RatioPolicy) -> Result<Self, IsiError>
    {
        let mut channels: Vec<ChannelState> = Vec::with_capacity(mode.channels.len());
        for spec in mode.channels {
            let regs = chip.channel_registers(spec.channel).ok_or_else(|| {
                IsiError::not_supported(format!("{} has no registers for {}", chip.id, spec.channel))
            })?;
            let owner = match regs.exposure {
                Some(_) => channels.len(),
                None => channels.iter().position(|c| c.spec.window == spec.window)
                    .ok_or_else(|| IsiError::not_supported(
                        format!("{} has no exposure register for {}", chip.id, spec.channel)))?,
            };
            let sub_line = regs.exposure.map_or(1, |e| e.sub_line);
            let int_codec = IntegrationCodec::new(
                mode.one_line_time, spec.min_lines, spec.max_lines, sub_line);
            let gain_codec = GainCodec::new(regs.gain.law);

            let mut state = ChannelState{
                spec, regs, gain_codec, int_codec, owner,
                gain: gain_codec.encode(spec.gain.min, spec.gain.max, spec.gain.min).into(),
                integration: int_codec.encode(0.0).into(),
                written_gain: None,
                written_lines: None,
            };
            if chip.readback {
                seed_from_registers(port, chip, mode, &mut state)?;
            }
            if owner != channels.len() {
                state.integration = channels[owner].integration;
                state.written_lines = channels[owner].written_lines;
            }
            debug!("{} {}: seeded gain {:.3} time {:.6}s", chip.id, spec.channel,
                   state.gain.gain, state.integration.time);
            channels.push(state);
        }
        info!("{} exposure control ready for {}", chip.id, mode);
        Ok(ExposureController{
            chip, mode,
            distributor: HdrDistributor::new(policy),
            ratios: vec![DEFAULT_HDR_RATIO; mode.ratio_slots()],
            channels,
        })
    }

    pub fn mode(&self) -> &'static SensorMode {
        self.mode
    }

    pub fn gain(&self, channel: ExposureChannel) -> Result<GainState, IsiError> {
        Ok(self.channels[self.index_of(channel)?].gain)
    }

    pub fn integration(&self, channel: ExposureChannel) -> Result<IntegrationState, IsiError> {
        Ok(self.channels[self.index_of(channel)?].integration)
    }

    /// HDR ratios used by the last `exposure_control`, after policy
    /// substitution.
    pub fn hdr_ratios(&self) -> &[f32] {
        &self.ratios
    }

    /// Applies `gain` to one channel and returns the gain actually set.
    pub fn set_gain<P: RegisterPort + ?Sized>(
        &mut self, port: &mut P, channel: ExposureChannel, gain: f32) -> Result<f32, IsiError>
    {
        let idx = self.index_of(channel)?;
        let mut updates: Vec<Update> = self.channels.iter().map(|_| Update::default()).collect();
        updates[idx].gain = Some(self.channels[idx].encode_gain(gain));
        self.apply(port, updates)?;
        Ok(self.channels[idx].gain.gain)
    }

    /// Applies `time` to one channel. Channels sharing an integration window
    /// set the window's time. Returns the time actually set and the frames
    /// to skip before it shows.
    pub fn set_integration_time<P: RegisterPort + ?Sized>(
        &mut self, port: &mut P, channel: ExposureChannel, time: f32)
        -> Result<(f32, u8), IsiError>
    {
        let owner = self.channels[self.index_of(channel)?].owner;
        let mut updates: Vec<Update> = self.channels.iter().map(|_| Update::default()).collect();
        updates[owner].lines = Some(self.channels[owner].int_codec.encode(time));
        let skip = self.apply(port, updates)?;
        Ok((self.channels[owner].integration.time, skip))
    }

    /// Executes one AE request. Linear modes apply it directly; HDR modes
    /// split it across their channels first. The result reports the
    /// reference channel.
    pub fn exposure_control<P: RegisterPort + ?Sized>(
        &mut self, port: &mut P, total_gain: f32, total_time: f32, ratios: &[f32])
        -> Result<ExposureResult, IsiError>
    {
        let mut updates: Vec<Update> = self.channels.iter().map(|_| Update::default()).collect();
        if self.mode.topology.is_hdr() {
            let distribution = self.distributor.distribute(
                self.mode, total_gain, total_time, ratios)?;
            for (i, target) in distribution.targets.iter().enumerate() {
                let state = &self.channels[i];
                updates[i].gain = Some(state.encode_gain(target.gain));
                if state.owner == i {
                    updates[i].lines = Some(state.int_codec.encode(target.integration_time));
                }
            }
            self.ratios = distribution.ratios;
        } else {
            let state = &self.channels[0];
            updates[0] = Update{lines: Some(state.int_codec.encode(total_time)),
                                gain: Some(state.encode_gain(total_gain))};
        }
        let frames_to_skip = self.apply(port, updates)?;
        let reference = &self.channels[self.channels.len() - 1];
        Ok(ExposureResult{gain: reference.gain.gain,
                          integration_time: reference.integration.time,
                          frames_to_skip})
    }

    pub fn ae_base_info(&self) -> AeBaseInfo {
        let channels: Vec<ChannelInfo> = self.channels.iter().map(|c| ChannelInfo{
            channel: c.spec.channel,
            gain: Limits{min: c.spec.gain.min, max: c.spec.gain.max},
            int_time: Limits{min: c.int_codec.min_time(), max: c.int_codec.max_time()},
            current_gain: c.gain.gain,
            current_int_time: c.integration.time,
        }).collect();
        let native_hdr_ratio = self.channels.windows(2).map(|pair| {
            let e0 = pair[0].gain.gain * pair[0].integration.time;
            let e1 = pair[1].gain.gain * pair[1].integration.time;
            if e1 > 0.0 { e0 / e1 } else { 0.0 }
        }).collect();
        let reference = &self.channels[self.channels.len() - 1];
        let reference_info = &channels[channels.len() - 1];
        AeBaseInfo{
            gain: reference_info.gain,
            int_time: reference_info.int_time,
            a_gain: reference.gain_codec.analog_range(),
            d_gain: reference.gain_codec.digital_range(),
            current_gain: reference.gain.gain,
            current_int_time: reference.integration.time,
            stitching_mode: matches!(self.mode.topology, HdrTopology::Stitched{..}),
            native_mode: matches!(self.mode.topology, HdrTopology::Native{..}),
            native_hdr_ratio,
            channels,
        }
    }

    fn index_of(&self, channel: ExposureChannel) -> Result<usize, IsiError> {
        self.channels.iter().position(|c| c.spec.channel == channel).ok_or_else(|| {
            IsiError::not_supported(format!("{} not available in mode {}",
                                            channel, self.mode.index))
        })
    }

    // Drops updates that match what is already in the registers, then writes
    // the rest inside one group hold. States advance only as their writes
    // succeed. Returns frames to skip.
    fn apply<P: RegisterPort + ?Sized>(&mut self, port: &mut P, mut updates: Vec<Update>)
                                       -> Result<u8, IsiError>
    {
        let chip = self.chip;
        let mode = self.mode;
        let mut frames_to_skip = 0;
        for (state, update) in self.channels.iter_mut().zip(updates.iter_mut()) {
            if let Some(code) = update.gain {
                if state.written_gain == Some(code.codes()) {
                    debug!("{}: gain {:.3} unchanged", state.spec.channel, code.gain);
                    state.gain = code.into();
                    update.gain = None;
                }
            }
            if let Some(code) = update.lines {
                frames_to_skip = frames_to_skip.max(IntegrationCodec::frames_to_skip(
                    state.written_lines, code.line_code, chip.exposure_latency));
                if state.written_lines == Some(code.line_code) {
                    debug!("{}: {} line codes unchanged", state.spec.channel, code.line_code);
                    state.integration = code.into();
                    update.lines = None;
                }
            }
        }
        if updates.iter().all(|u| u.gain.is_none() && u.lines.is_none()) {
            self.propagate_shared_windows();
            return Ok(0);
        }

        write_sequence(port, chip.group_hold.begin)?;
        let mut failure = None;
        for (state, update) in self.channels.iter_mut().zip(&updates) {
            let result = match chip.write_order {
                WriteOrder::ExposureFirst => write_lines(port, mode, state, update.lines)
                    .and_then(|_| write_gain(port, state, update.gain)),
                WriteOrder::GainFirst => write_gain(port, state, update.gain)
                    .and_then(|_| write_lines(port, mode, state, update.lines)),
            };
            if let Err(e) = result {
                warn!("{} {}: aborting exposure update: {}", chip.id, state.spec.channel, e);
                failure = Some(e);
                break;
            }
        }
        self.propagate_shared_windows();
        if let Some(e) = failure {
            return Err(e.into());
        }
        write_sequence(port, chip.group_hold.end)?;
        Ok(frames_to_skip)
    }

    // Channels without their own exposure register follow their window owner.
    fn propagate_shared_windows(&mut self) {
        for i in 0..self.channels.len() {
            let owner = self.channels[i].owner;
            if owner != i {
                self.channels[i].integration = self.channels[owner].integration;
                self.channels[i].written_lines = self.channels[owner].written_lines;
            }
        }
    }
}

fn write_lines<P: RegisterPort + ?Sized>(
    port: &mut P, mode: &SensorMode, state: &mut ChannelState, lines: Option<IntegrationCode>)
    -> Result<(), RegisterAccessError>
{
    let (Some(code), Some(exposure)) = (lines, state.regs.exposure) else {
        return Ok(());
    };
    let value = exposure.encoding.to_register(
        mode.frame_length_lines * exposure.sub_line, code.line_code);
    write_field(port, &exposure.field, value)?;
    state.integration = code.into();
    state.written_lines = Some(code.line_code);
    Ok(())
}

fn write_gain<P: RegisterPort + ?Sized>(
    port: &mut P, state: &mut ChannelState, gain: Option<GainCode>)
    -> Result<(), RegisterAccessError>
{
    let Some(code) = gain else {
        return Ok(());
    };
    write_field(port, &state.regs.gain.coarse, code.analog_code as u32)?;
    if let Some(fine) = &state.regs.gain.fine {
        write_field(port, fine, code.digital_code as u32)?;
    }
    state.gain = code.into();
    state.written_gain = Some(code.codes());
    Ok(())
}

fn seed_from_registers<P: RegisterPort + ?Sized>(
    port: &mut P, chip: &ChipDescriptor, mode: &SensorMode, state: &mut ChannelState)
    -> Result<(), IsiError>
{
    let coarse = read_field(port, &state.regs.gain.coarse)? as u16;
    let fine = match &state.regs.gain.fine {
        Some(field) => read_field(port, field)? as u16,
        None => 0,
    };
    // Only codes encode() can produce are trusted.
    if let Some(gain) = state.gain_codec.decode(coarse, fine) {
        let code = state.encode_gain(gain);
        if code.codes() == (coarse, fine) {
            state.gain = code.into();
            state.written_gain = Some((coarse, fine));
        }
    }
    if state.written_gain.is_none() {
        debug!("{} {}: gain codes ({}, {}) not usable, starting at minimum",
               chip.id, state.spec.channel, coarse, fine);
    }

    if let Some(exposure) = state.regs.exposure {
        let raw = read_field(port, &exposure.field)?;
        let line_code = exposure.encoding.from_register(
            mode.frame_length_lines * exposure.sub_line, raw);
        if line_code >= state.int_codec.min_code() && line_code <= state.int_codec.max_code() {
            state.integration = IntegrationState{line_code,
                                                 time: state.int_codec.decode(line_code)};
            state.written_lines = Some(line_code);
        } else {
            debug!("{} {}: exposure register {:#x} out of range, starting at minimum",
                   chip.id, state.spec.channel, raw);
        }
    }
    Ok(())
}
