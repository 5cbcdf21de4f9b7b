use crate::backend::TtlPort;
use crate::error::TtlError;
use audmem_timing::{HighPrecisionTimer, Timer};
use std::time::Duration;

/// How long a code stays on the data lines before they return to zero.
pub const PULSE_WIDTH: Duration = Duration::from_millis(1);

/// Writes codes straight to a parallel port data register through `/dev/port`.
pub struct ParallelPort {
    address: u16,
    timer: HighPrecisionTimer,
    #[cfg(target_os = "linux")]
    device: std::fs::File,
}

impl ParallelPort {
    #[cfg(target_os = "linux")]
    pub fn open(address: u16) -> Result<Self, TtlError> {
        let device = std::fs::OpenOptions::new().write(true).open("/dev/port")?;
        let mut port = Self {
            address,
            timer: HighPrecisionTimer::new(),
            device,
        };
        port.write_data(0)?;
        Ok(port)
    }

    #[cfg(not(target_os = "linux"))]
    pub fn open(_address: u16) -> Result<Self, TtlError> {
        Err(TtlError::Unsupported("Direct parallel port access"))
    }

    #[cfg(target_os = "linux")]
    fn write_data(&mut self, value: u8) -> Result<(), TtlError> {
        use std::io::{Seek, SeekFrom, Write};
        self.device.seek(SeekFrom::Start(self.address as u64))?;
        self.device.write_all(&[value])?;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn write_data(&mut self, _value: u8) -> Result<(), TtlError> {
        Err(TtlError::Unsupported("Direct parallel port access"))
    }
}

impl TtlPort for ParallelPort {
    fn send(&mut self, code: u8) -> Result<(), TtlError> {
        self.write_data(code)?;
        self.timer.sleep(PULSE_WIDTH);
        self.write_data(0)?;
        log::debug!("TTL {code} via parallel port {:04X}", self.address);
        Ok(())
    }
}
