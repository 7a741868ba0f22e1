// Register access seam between the exposure engine and the sensor's control
// bus. The engine only ever sees `RegisterPort`; chips describe where their
// values live with `RegisterField`.

use serde::Serialize;

use crate::error::RegisterAccessError;

/// Blocking read/write of single sensor registers. Every call is one bus
/// transaction; the engine never retries a failed one.
pub trait RegisterPort {
    fn read(&mut self, addr: u16) -> Result<u16, RegisterAccessError>;
    fn write(&mut self, addr: u16, value: u16) -> Result<(), RegisterAccessError>;
}

impl<T: RegisterPort + ?Sized> RegisterPort for &mut T {
    fn read(&mut self, addr: u16) -> Result<u16, RegisterAccessError> {
        (**self).read(addr)
    }
    fn write(&mut self, addr: u16, value: u16) -> Result<(), RegisterAccessError> {
        (**self).write(addr, value)
    }
}

impl<T: RegisterPort + ?Sized> RegisterPort for Box<T> {
    fn read(&mut self, addr: u16) -> Result<u16, RegisterAccessError> {
        (**self).read(addr)
    }
    fn write(&mut self, addr: u16, value: u16) -> Result<(), RegisterAccessError> {
        (**self).write(addr, value)
    }
}

/// One literal register write, as found in init, stream and group-hold
/// sequences.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterWrite {
    pub addr: u16,
    pub value: u16,
}

pub const fn reg(addr: u16, value: u16) -> RegisterWrite {
    RegisterWrite{addr, value}
}

/// How a multi-register value is laid out on the bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum FieldLayout {
    /// A single 16-bit register (onsemi style).
    Word,
    /// `n` consecutive 8-bit registers, most significant byte first
    /// (OmniVision and SMIA style). `n` is 1..=4.
    BytesBe(u8),
    /// `n` consecutive 8-bit registers, least significant byte first (Sony
    /// style).
    BytesLe(u8),
}

/// Location of one logical value (exposure lines, coarse gain, ...) in the
/// sensor's register space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterField {
    pub addr: u16,
    pub layout: FieldLayout,
    /// Bits of the value actually stored; upper bits are masked off.
    pub bits: u8,
}

impl RegisterField {
    pub const fn word(addr: u16) -> Self {
        RegisterField{addr, layout: FieldLayout::Word, bits: 16}
    }

    pub const fn bytes(addr: u16, count: u8, bits: u8) -> Self {
        RegisterField{addr, layout: FieldLayout::BytesBe(count), bits}
    }

    pub const fn bytes_le(addr: u16, count: u8, bits: u8) -> Self {
        RegisterField{addr, layout: FieldLayout::BytesLe(count), bits}
    }

    pub fn mask(&self) -> u32 {
        if self.bits >= 32 { u32::MAX } else { (1u32 << self.bits) - 1 }
    }

    /// Number of bus writes needed to store this field.
    pub fn write_count(&self) -> usize {
        match self.layout {
            FieldLayout::Word => 1,
            FieldLayout::BytesBe(n) | FieldLayout::BytesLe(n) => n as usize,
        }
    }
}

/// Writes `value` into `field`, one byte register at a time in address order
/// for byte-split fields.
pub fn write_field<P: RegisterPort + ?Sized>(
    port: &mut P, field: &RegisterField, value: u32)
    -> Result<(), RegisterAccessError>
{
    let value = value & field.mask();
    match field.layout {
        FieldLayout::Word => port.write(field.addr, value as u16),
        FieldLayout::BytesBe(n) => {
            for i in 0..n {
                let shift = 8 * (n - 1 - i) as u32;
                port.write(field.addr + i as u16, ((value >> shift) & 0xff) as u16)?;
            }
            Ok(())
        },
        FieldLayout::BytesLe(n) => {
            for i in 0..n {
                port.write(field.addr + i as u16, ((value >> (8 * i as u32)) & 0xff) as u16)?;
            }
            Ok(())
        },
    }
}

pub fn read_field<P: RegisterPort + ?Sized>(
    port: &mut P, field: &RegisterField) -> Result<u32, RegisterAccessError>
{
    let raw = match field.layout {
        FieldLayout::Word => port.read(field.addr)? as u32,
        FieldLayout::BytesBe(n) => {
            let mut value = 0u32;
            for i in 0..n {
                value = (value << 8) | (port.read(field.addr + i as u16)? as u32 & 0xff);
            }
            value
        },
        FieldLayout::BytesLe(n) => {
            let mut value = 0u32;
            for i in 0..n {
                value |= (port.read(field.addr + i as u16)? as u32 & 0xff) << (8 * i as u32);
            }
            value
        },
    };
    Ok(raw & field.mask())
}

pub fn write_sequence<P: RegisterPort + ?Sized>(
    port: &mut P, sequence: &[RegisterWrite]) -> Result<(), RegisterAccessError>
{
    for w in sequence {
        port.write(w.addr, w.value)?;
    }
    Ok(())
}

/// Width of the data phase on a register-addressed I2C sensor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataWidth {
    Byte,
    Word,
}

/// `RegisterPort` over an `embedded-hal` blocking I2C bus, for sensors with
/// 16-bit register addresses.
pub struct I2cRegisterPort<I2C> {
    i2c: I2C,
    address: u8,
    data_width: DataWidth,
}

impl<I2C, CommE> I2cRegisterPort<I2C>
where
    I2C: embedded_hal::blocking::i2c::Write<Error = CommE>
        + embedded_hal::blocking::i2c::WriteRead<Error = CommE>,
    CommE: core::fmt::Debug,
{
    pub fn new(i2c: I2C, address: u8, data_width: DataWidth) -> Self {
        I2cRegisterPort{i2c, address, data_width}
    }

    /// Gives back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, CommE> RegisterPort for I2cRegisterPort<I2C>
where
    I2C: embedded_hal::blocking::i2c::Write<Error = CommE>
        + embedded_hal::blocking::i2c::WriteRead<Error = CommE>,
    CommE: core::fmt::Debug,
{
    fn read(&mut self, addr: u16) -> Result<u16, RegisterAccessError> {
        let cmd_buf = addr.to_be_bytes();
        match self.data_width {
            DataWidth::Byte => {
                let mut recv_buf = [0u8];
                self.i2c.write_read(self.address, &cmd_buf, &mut recv_buf)
                    .map_err(|e| RegisterAccessError::read(addr, format!("{:?}", e)))?;
                Ok(recv_buf[0] as u16)
            },
            DataWidth::Word => {
                let mut recv_buf = [0u8; 2];
                self.i2c.write_read(self.address, &cmd_buf, &mut recv_buf)
                    .map_err(|e| RegisterAccessError::read(addr, format!("{:?}", e)))?;
                Ok(u16::from_be_bytes(recv_buf))
            },
        }
    }

    fn write(&mut self, addr: u16, value: u16) -> Result<(), RegisterAccessError> {
        let [addr_hi, addr_lo] = addr.to_be_bytes();
        let result = match self.data_width {
            DataWidth::Byte =>
                self.i2c.write(self.address, &[addr_hi, addr_lo, (value & 0xff) as u8]),
            DataWidth::Word => {
                let [hi, lo] = value.to_be_bytes();
                self.i2c.write(self.address, &[addr_hi, addr_lo, hi, lo])
            },
        };
        result.map_err(|e| RegisterAccessError::write(addr, format!("{:?}", e)))
    }
}
