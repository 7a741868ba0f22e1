// In-memory register file standing in for a sensor. For testing and for the
// command line tools when no hardware is attached.

use std::collections::HashMap;

use crate::error::RegisterAccessError;
use crate::register_port::{RegisterPort, RegisterWrite};

#[derive(Clone, Debug, Default)]
pub struct SimulatedPort {
    registers: HashMap<u16, u16>,

    // Every successful write, in bus order.
    write_log: Vec<RegisterWrite>,
    read_count: usize,

    // Fault injection.
    fail_write_at: Option<u16>,
    writes_before_failure: Option<usize>,
    fail_reads: bool,
}

impl SimulatedPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads register contents without logging them as writes.
    pub fn with_registers(values: &[(u16, u16)]) -> Self {
        let mut port = Self::new();
        for &(addr, value) in values {
            port.registers.insert(addr, value);
        }
        port
    }

    pub fn register(&self, addr: u16) -> u16 {
        self.registers.get(&addr).copied().unwrap_or(0)
    }

    pub fn set_register(&mut self, addr: u16, value: u16) {
        self.registers.insert(addr, value);
    }

    pub fn writes(&self) -> &[RegisterWrite] {
        &self.write_log
    }

    pub fn write_count(&self) -> usize {
        self.write_log.len()
    }

    pub fn read_count(&self) -> usize {
        self.read_count
    }

    pub fn clear_log(&mut self) {
        self.write_log.clear();
    }

    /// Any write to `addr` fails from now on.
    pub fn fail_writes_to(&mut self, addr: u16) {
        self.fail_write_at = Some(addr);
    }

    /// The next `count` writes succeed, all later ones fail.
    pub fn fail_after_writes(&mut self, count: usize) {
        self.writes_before_failure = Some(count);
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn heal(&mut self) {
        self.fail_write_at = None;
        self.writes_before_failure = None;
        self.fail_reads = false;
    }
}

impl RegisterPort for SimulatedPort {
    fn read(&mut self, addr: u16) -> Result<u16, RegisterAccessError> {
        if self.fail_reads {
            return Err(RegisterAccessError::read(addr, "injected read failure"));
        }
        self.read_count += 1;
        Ok(self.register(addr))
    }

    fn write(&mut self, addr: u16, value: u16) -> Result<(), RegisterAccessError> {
        if self.fail_write_at == Some(addr) {
            return Err(RegisterAccessError::write(addr, "injected write failure"));
        }
        if let Some(remaining) = self.writes_before_failure {
            if remaining == 0 {
                return Err(RegisterAccessError::write(addr, "injected write failure"));
            }
            self.writes_before_failure = Some(remaining - 1);
        }
        self.registers.insert(addr, value);
        self.write_log.push(RegisterWrite{addr, value});
        Ok(())
    }
}
