use canonical_error::CanonicalError;

use crate::chip::ChipId;
use crate::exposure_controller::{AeBaseInfo, ExposureResult};
use crate::mode::{ExposureChannel, SensorMode};
use crate::register_port::RegisterPort;
use crate::streaming::{SensorSession, StreamingState};

/// SensorDriver is the operation set an ISP core drives a sensor through:
/// lifecycle, raw register access, mode selection and the AEC primitives.
/// Every supported chip is driven by the same `SensorSession` engine; the
/// trait lets callers hold any of them behind one boxed type.
///
/// Errors are reported as `CanonicalError`: invalid_argument for bad mode
/// indices and channels the mode lacks, failed_precondition for calls in the
/// wrong lifecycle state and for register transport failures.
pub trait SensorDriver {
    // Unchanging attributes.

    /// Returns a string identifying the sensor, e.g. "Sony IMX334".
    fn model(&self) -> String;

    fn chip(&self) -> ChipId;

    /// Reads the chip id register and checks it against the expected value.
    fn check_connection(&mut self) -> Result<(), CanonicalError>;

    fn enumerate_mode(&self, index: usize) -> Result<&'static SensorMode, CanonicalError>;

    // Lifecycle.

    /// Selects mode `index`. Not allowed while streaming.
    fn set_mode(&mut self, index: usize) -> Result<&'static SensorMode, CanonicalError>;
    fn current_mode(&self) -> Option<&'static SensorMode>;

    fn state(&self) -> StreamingState;
    fn set_streaming(&mut self, on: bool) -> Result<(), CanonicalError>;

    /// Stops streaming if needed. All later calls fail.
    fn release(&mut self) -> Result<(), CanonicalError>;

    // Raw register access.

    fn read_register(&mut self, addr: u16) -> Result<u16, CanonicalError>;
    fn write_register(&mut self, addr: u16, value: u16) -> Result<(), CanonicalError>;

    // AEC primitives. Gains are ratios (1.0 == unity), times are seconds.

    fn get_gain(&self, channel: ExposureChannel) -> Result<f32, CanonicalError>;

    /// Returns the gain actually applied after clamping and quantization.
    fn set_gain(&mut self, channel: ExposureChannel, gain: f32) -> Result<f32, CanonicalError>;

    fn get_integration_time(&self, channel: ExposureChannel) -> Result<f32, CanonicalError>;

    /// Returns the time actually applied and the number of frames to skip
    /// before it is visible in the output.
    fn set_integration_time(&mut self, channel: ExposureChannel, time: f32)
                            -> Result<(f32, u8), CanonicalError>;

    /// Applies one AE request, split across the mode's HDR channels using
    /// `hdr_ratios` where the mode has more than one.
    fn exposure_control(&mut self, total_gain: f32, total_integration_time: f32,
                        hdr_ratios: &[f32]) -> Result<ExposureResult, CanonicalError>;

    fn ae_base_info(&self) -> Result<AeBaseInfo, CanonicalError>;

    /// HDR ratios in effect after the last exposure_control().
    fn cur_hdr_ratio(&self) -> Result<Vec<f32>, CanonicalError>;
}

impl<P: RegisterPort> SensorDriver for SensorSession<P> {
    fn model(&self) -> String {
        self.chip().model.to_string()
    }

    fn chip(&self) -> ChipId {
        SensorSession::chip(self).id
    }

    fn check_connection(&mut self) -> Result<(), CanonicalError> {
        Ok(SensorSession::check_connection(self)?)
    }

    fn enumerate_mode(&self, index: usize) -> Result<&'static SensorMode, CanonicalError> {
        Ok(SensorSession::enumerate_mode(self, index)?)
    }

    fn set_mode(&mut self, index: usize) -> Result<&'static SensorMode, CanonicalError> {
        Ok(SensorSession::set_mode(self, index)?)
    }

    fn current_mode(&self) -> Option<&'static SensorMode> {
        SensorSession::current_mode(self)
    }

    fn state(&self) -> StreamingState {
        SensorSession::state(self)
    }

    fn set_streaming(&mut self, on: bool) -> Result<(), CanonicalError> {
        Ok(SensorSession::set_streaming(self, on)?)
    }

    fn release(&mut self) -> Result<(), CanonicalError> {
        Ok(SensorSession::release(self)?)
    }

    fn read_register(&mut self, addr: u16) -> Result<u16, CanonicalError> {
        Ok(SensorSession::read_register(self, addr)?)
    }

    fn write_register(&mut self, addr: u16, value: u16) -> Result<(), CanonicalError> {
        Ok(SensorSession::write_register(self, addr, value)?)
    }

    fn get_gain(&self, channel: ExposureChannel) -> Result<f32, CanonicalError> {
        Ok(SensorSession::get_gain(self, channel)?)
    }

    fn set_gain(&mut self, channel: ExposureChannel, gain: f32) -> Result<f32, CanonicalError> {
        Ok(SensorSession::set_gain(self, channel, gain)?)
    }

    fn get_integration_time(&self, channel: ExposureChannel) -> Result<f32, CanonicalError> {
        Ok(SensorSession::get_integration_time(self, channel)?)
    }

    fn set_integration_time(&mut self, channel: ExposureChannel, time: f32)
                            -> Result<(f32, u8), CanonicalError> {
        Ok(SensorSession::set_integration_time(self, channel, time)?)
    }

    fn exposure_control(&mut self, total_gain: f32, total_integration_time: f32,
                        hdr_ratios: &[f32]) -> Result<ExposureResult, CanonicalError> {
        Ok(SensorSession::exposure_control(self, total_gain, total_integration_time,
                                           hdr_ratios)?)
    }

    fn ae_base_info(&self) -> Result<AeBaseInfo, CanonicalError> {
        Ok(SensorSession::ae_base_info(self)?)
    }

    fn cur_hdr_ratio(&self) -> Result<Vec<f32>, CanonicalError> {
        Ok(SensorSession::cur_hdr_ratio(self)?)
    }
}
