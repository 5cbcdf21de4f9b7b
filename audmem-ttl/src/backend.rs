use crate::error::TtlError;
use crate::parallel::ParallelPort;
use crate::serial::{SerialKind, SerialTtl};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A transport that delivers single trigger codes.
pub trait TtlPort {
    fn send(&mut self, code: u8) -> Result<(), TtlError>;

    fn close(&mut self) -> Result<(), TtlError> {
        Ok(())
    }
}

/// Transport selected at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TtlBackend {
    None,
    /// USB-to-TTL serial adapter, e.g. `COM4` or `/dev/ttyUSB0`.
    #[serde(rename = "USB")]
    Usb { port: String },
    /// MMB serial trigger box.
    #[serde(rename = "MMB")]
    Mmb { port: String },
    /// Direct parallel port data register, e.g. `DFF8`.
    ParallelPort { address: u16 },
}

impl TtlBackend {
    /// Builds a backend from its configuration name and port/address string.
    pub fn parse(kind: &str, address: Option<&str>) -> Result<Self, TtlError> {
        let need = |kind: &str| {
            address
                .map(str::to_string)
                .ok_or_else(|| TtlError::InvalidAddress(format!("{kind} needs a port")))
        };
        match kind.to_ascii_lowercase().as_str() {
            "none" => Ok(TtlBackend::None),
            "usb" | "usb_ttl" => Ok(TtlBackend::Usb { port: need("USB")? }),
            "mmb" => Ok(TtlBackend::Mmb { port: need("MMB")? }),
            "parallelport" | "parallel" => {
                let raw = need("ParallelPort")?;
                let digits = raw.trim_start_matches("0x").trim_start_matches("0X");
                let address = u16::from_str_radix(digits, 16)
                    .map_err(|_| TtlError::InvalidAddress(raw.clone()))?;
                Ok(TtlBackend::ParallelPort { address })
            }
            _ => Err(TtlError::UnknownBackend(kind.to_string())),
        }
    }
}

impl fmt::Display for TtlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtlBackend::None => write!(f, "None"),
            TtlBackend::Usb { port } => write!(f, "USB ({port})"),
            TtlBackend::Mmb { port } => write!(f, "MMB ({port})"),
            TtlBackend::ParallelPort { address } => write!(f, "ParallelPort ({address:04X})"),
        }
    }
}

/// Opens the configured transport. Missing hardware is an error.
pub fn open(backend: &TtlBackend) -> Result<Box<dyn TtlPort>, TtlError> {
    let port: Box<dyn TtlPort> = match backend {
        TtlBackend::None => Box::new(NullPort),
        TtlBackend::Usb { port } => Box::new(SerialTtl::open(SerialKind::Usb, port)?),
        TtlBackend::Mmb { port } => Box::new(SerialTtl::open(SerialKind::Mmb, port)?),
        TtlBackend::ParallelPort { address } => Box::new(ParallelPort::open(*address)?),
    };
    log::info!("TTL backend: {backend}");
    Ok(port)
}

/// Stand-in used when no trigger hardware is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPort;

impl TtlPort for NullPort {
    fn send(&mut self, code: u8) -> Result<(), TtlError> {
        log::trace!("TTL {code} (no hardware)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_backend_name() {
        assert_eq!(TtlBackend::parse("None", None).unwrap(), TtlBackend::None);
        assert_eq!(
            TtlBackend::parse("USB", Some("COM4")).unwrap(),
            TtlBackend::Usb {
                port: "COM4".into()
            }
        );
        assert_eq!(
            TtlBackend::parse("mmb", Some("/dev/ttyUSB0")).unwrap(),
            TtlBackend::Mmb {
                port: "/dev/ttyUSB0".into()
            }
        );
        assert_eq!(
            TtlBackend::parse("ParallelPort", Some("DFF8")).unwrap(),
            TtlBackend::ParallelPort { address: 0xDFF8 }
        );
        assert_eq!(
            TtlBackend::parse("parallel", Some("0x378")).unwrap(),
            TtlBackend::ParallelPort { address: 0x378 }
        );
    }

    #[test]
    fn rejects_bad_names_and_addresses() {
        assert!(matches!(
            TtlBackend::parse("Arduino", None),
            Err(TtlError::UnknownBackend(_))
        ));
        assert!(matches!(
            TtlBackend::parse("USB", None),
            Err(TtlError::InvalidAddress(_))
        ));
        assert!(matches!(
            TtlBackend::parse("ParallelPort", Some("XYZ")),
            Err(TtlError::InvalidAddress(_))
        ));
    }

    #[test]
    fn null_port_accepts_any_code() {
        let mut port = open(&TtlBackend::None).unwrap();
        for code in [0u8, 1, 255] {
            port.send(code).unwrap();
        }
        port.close().unwrap();
    }

    #[test]
    fn missing_serial_device_is_reported() {
        let err = open(&TtlBackend::Usb {
            port: "/dev/definitely-not-a-tty".into(),
        })
        .err()
        .unwrap();
        assert!(matches!(err, TtlError::DeviceNotFound { .. }));
    }
}
