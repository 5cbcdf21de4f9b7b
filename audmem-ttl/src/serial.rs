use crate::backend::TtlPort;
use crate::error::TtlError;
use std::io::Write;
use std::time::Duration;

/// Serial trigger hardware flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialKind {
    Usb,
    Mmb,
}

impl SerialKind {
    pub fn baud_rate(&self) -> u32 {
        match self {
            SerialKind::Usb => 128_000,
            SerialKind::Mmb => 9_600,
        }
    }

    fn device_name(&self) -> &'static str {
        match self {
            SerialKind::Usb => "USB TTL",
            SerialKind::Mmb => "MMB trigger box",
        }
    }
}

// serialport applies the timeout to writes too, so it cannot be zero
const WRITE_TIMEOUT: Duration = Duration::from_millis(10);

pub struct SerialTtl {
    kind: SerialKind,
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTtl {
    pub fn open(kind: SerialKind, path: &str) -> Result<Self, TtlError> {
        let port = serialport::new(path, kind.baud_rate())
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|source| TtlError::DeviceNotFound {
                device: kind.device_name(),
                port: path.to_string(),
                source,
            })?;
        Ok(Self { kind, port })
    }
}

impl TtlPort for SerialTtl {
    fn send(&mut self, code: u8) -> Result<(), TtlError> {
        self.port.write_all(&[code])?;
        log::debug!("TTL {code} via {}", self.kind.device_name());
        Ok(())
    }

    fn close(&mut self) -> Result<(), TtlError> {
        self.port.flush()?;
        Ok(())
    }
}
