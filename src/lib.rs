// Copyright (c) 2023 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

pub mod chip;
pub mod chips;
pub mod error;
pub mod exposure_controller;
pub mod gain_codec;
pub mod hdr_distributor;
pub mod integration_codec;
pub mod mode;
pub mod register_port;
pub mod select_sensor;
pub mod sensor_driver;
pub mod simulated_port;
pub mod streaming;
