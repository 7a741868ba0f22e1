// Sensor session: one owned handle per physical sensor, carrying the
// streaming state machine and the exposure controller of the current mode.
//
//   Created -(set_mode)-> Configured -(set_streaming(true))-> Streaming
//                         Configured <-(set_streaming(false))- Streaming
//   any -(release)-> Released

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::chip::ChipDescriptor;
use crate::error::IsiError;
use crate::exposure_controller::{AeBaseInfo, ExposureController, ExposureResult};
use crate::hdr_distributor::RatioPolicy;
use crate::mode::{ExposureChannel, SensorMode};
use crate::register_port::{read_field, write_sequence, RegisterPort};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum StreamingState {
    Created,
    Configured,
    Streaming,
    Released,
}

impl fmt::Display for StreamingState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)  // Just re-use Debug.
    }
}

pub struct SensorSession<P: RegisterPort> {
    chip: &'static ChipDescriptor,
    port: P,
    state: StreamingState,
    policy: RatioPolicy,

    // Present from a successful set_mode() until release() or a failed
    // set_mode().
    controller: Option<ExposureController>,
}

impl<P: RegisterPort> SensorSession<P> {
    pub fn create(chip: &'static ChipDescriptor, port: P) -> Self {
        Self::with_ratio_policy(chip, port, RatioPolicy::default())
    }

    pub fn with_ratio_policy(chip: &'static ChipDescriptor, port: P, policy: RatioPolicy)
                             -> Self {
        debug!("Created {} session with {:?}", chip.model, policy);
        SensorSession{chip, port, state: StreamingState::Created, policy, controller: None}
    }

    pub fn chip(&self) -> &'static ChipDescriptor {
        self.chip
    }

    pub fn state(&self) -> StreamingState {
        self.state
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Compares the sensor's chip id register with the descriptor.
    pub fn check_connection(&mut self) -> Result<(), IsiError> {
        self.check_handle()?;
        let found = read_field(&mut self.port, &self.chip.chip_id_field)?;
        if found != self.chip.chip_id_value {
            return Err(IsiError::WrongChipId{expected: self.chip.chip_id_value, found});
        }
        Ok(())
    }

    pub fn enumerate_mode(&self, index: usize) -> Result<&'static SensorMode, IsiError> {
        self.check_handle()?;
        self.chip.modes.enumerate(index)
    }

    pub fn current_mode(&self) -> Option<&'static SensorMode> {
        self.controller.as_ref().map(|c| c.mode())
    }

    /// Writes the mode's init sequence and re-seeds exposure state from the
    /// sensor. Not allowed while streaming. On failure the session drops back
    /// to `Created` and needs another set_mode().
    pub fn set_mode(&mut self, index: usize) -> Result<&'static SensorMode, IsiError> {
        self.check_handle()?;
        if self.state == StreamingState::Streaming {
            return Err(IsiError::WrongState(self.state));
        }
        let mode = self.chip.modes.enumerate(index)?;
        let configured = write_sequence(&mut self.port, mode.init_sequence)
            .map_err(IsiError::from)
            .and_then(|()| ExposureController::initialize_from_mode(
                &mut self.port, self.chip, mode, self.policy));
        match configured {
            Ok(controller) => {
                self.controller = Some(controller);
                self.state = StreamingState::Configured;
                info!("{} set to {}", self.chip.model, mode);
                Ok(mode)
            },
            Err(e) => {
                // The sensor may be half way into the new mode; the old
                // exposure state no longer describes it.
                self.controller = None;
                self.state = StreamingState::Created;
                warn!("{} set to {} failed: {}", self.chip.model, mode, e);
                Err(e)
            },
        }
    }

    pub fn set_streaming(&mut self, on: bool) -> Result<(), IsiError> {
        self.check_handle()?;
        match (self.state, on) {
            (StreamingState::Created, _) => Err(IsiError::WrongState(self.state)),
            (StreamingState::Streaming, true) | (StreamingState::Configured, false) => Ok(()),
            (_, true) => {
                write_sequence(&mut self.port, self.chip.stream_on)?;
                self.state = StreamingState::Streaming;
                info!("{} streaming", self.chip.model);
                Ok(())
            },
            (_, false) => {
                write_sequence(&mut self.port, self.chip.stream_off)?;
                self.state = StreamingState::Configured;
                info!("{} stopped streaming", self.chip.model);
                Ok(())
            },
        }
    }

    /// Stops streaming (ignoring failure) and invalidates the session.
    pub fn release(&mut self) -> Result<(), IsiError> {
        self.check_handle()?;
        if self.state == StreamingState::Streaming {
            if let Err(e) = self.set_streaming(false) {
                warn!("{} stream off during release failed: {}", self.chip.model, e);
            }
        }
        self.controller = None;
        self.state = StreamingState::Released;
        info!("{} released", self.chip.model);
        Ok(())
    }

    pub fn read_register(&mut self, addr: u16) -> Result<u16, IsiError> {
        self.check_handle()?;
        Ok(self.port.read(addr)?)
    }

    pub fn write_register(&mut self, addr: u16, value: u16) -> Result<(), IsiError> {
        self.check_handle()?;
        Ok(self.port.write(addr, value)?)
    }

    pub fn get_gain(&self, channel: ExposureChannel) -> Result<f32, IsiError> {
        Ok(self.controller()?.gain(channel)?.gain)
    }

    pub fn set_gain(&mut self, channel: ExposureChannel, gain: f32) -> Result<f32, IsiError> {
        let (controller, port) = self.aec()?;
        controller.set_gain(port, channel, gain)
    }

    pub fn get_integration_time(&self, channel: ExposureChannel) -> Result<f32, IsiError> {
        Ok(self.controller()?.integration(channel)?.time)
    }

    pub fn set_integration_time(&mut self, channel: ExposureChannel, time: f32)
                                -> Result<(f32, u8), IsiError> {
        let (controller, port) = self.aec()?;
        controller.set_integration_time(port, channel, time)
    }

    pub fn exposure_control(&mut self, total_gain: f32, total_integration_time: f32,
                            hdr_ratios: &[f32]) -> Result<ExposureResult, IsiError> {
        let (controller, port) = self.aec()?;
        controller.exposure_control(port, total_gain, total_integration_time, hdr_ratios)
    }

    pub fn ae_base_info(&self) -> Result<AeBaseInfo, IsiError> {
        Ok(self.controller()?.ae_base_info())
    }

    pub fn cur_hdr_ratio(&self) -> Result<Vec<f32>, IsiError> {
        Ok(self.controller()?.hdr_ratios().to_vec())
    }

    fn check_handle(&self) -> Result<(), IsiError> {
        if self.state == StreamingState::Released {
            return Err(IsiError::WrongHandle);
        }
        Ok(())
    }

    fn controller(&self) -> Result<&ExposureController, IsiError> {
        self.check_handle()?;
        self.controller.as_ref().ok_or(IsiError::WrongState(self.state))
    }

    fn aec(&mut self) -> Result<(&mut ExposureController, &mut P), IsiError> {
        self.check_handle()?;
        match self.controller.as_mut() {
            Some(controller) => Ok((controller, &mut self.port)),
            None => Err(IsiError::WrongState(self.state)),
        }
    }
}

impl<P: RegisterPort> Drop for SensorSession<P> {
    fn drop(&mut self) {
        if self.state == StreamingState::Streaming {
            if let Err(e) = write_sequence(&mut self.port, self.chip.stream_off) {
                warn!("{} stream off on drop failed: {}", self.chip.model, e);
            }
        }
    }
}
