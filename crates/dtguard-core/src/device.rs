use std::fmt;
use std::str::FromStr;

use crate::error::GuardError;

/// Where tensor data lives.
///
/// Only the identity of a device: comparable, hashable and printable as
/// `TYPE:ID` (`CPU:0`, `CUDA:1`). No memory is managed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Device {
    /// Host CPU.
    #[default]
    Cpu,
    /// CUDA GPU with device index
    Cuda(usize),
    /// SYCL device with device index
    Sycl(usize),
}

impl Device {
    /// Whether this is a CPU device.
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }

    /// Whether this is a CUDA device.
    pub fn is_cuda(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }

    /// Whether this is a SYCL device.
    pub fn is_sycl(&self) -> bool {
        matches!(self, Device::Sycl(_))
    }

    /// Get the CUDA device index, if applicable.
    pub fn cuda_index(&self) -> Option<usize> {
        match self {
            Device::Cuda(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Device index; always 0 for the CPU.
    pub fn index(&self) -> usize {
        match self {
            Device::Cpu => 0,
            Device::Cuda(idx) | Device::Sycl(idx) => *idx,
        }
    }

    /// Upper-case type label used in the string form.
    pub fn type_name(&self) -> &'static str {
        match self {
            Device::Cpu => "CPU",
            Device::Cuda(_) => "CUDA",
            Device::Sycl(_) => "SYCL",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name(), self.index())
    }
}

impl FromStr for Device {
    type Err = GuardError;

    /// Parse `"CPU:0"`, `"cuda:1"`, `"SYCL:0"`. The type is case-insensitive;
    /// the index may be left out for the CPU only, and must be 0 there.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GuardError::InvalidDevice(s.to_string());
        let (kind, index) = match s.trim().split_once(':') {
            Some((kind, index)) => {
                let index = index.parse::<usize>().map_err(|_| invalid())?;
                (kind, Some(index))
            }
            None => (s.trim(), None),
        };
        match (kind.to_ascii_uppercase().as_str(), index) {
            ("CPU", None | Some(0)) => Ok(Device::Cpu),
            ("CUDA", Some(idx)) => Ok(Device::Cuda(idx)),
            ("SYCL", Some(idx)) => Ok(Device::Sycl(idx)),
            _ => Err(invalid()),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Device {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Device {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_properties() {
        assert!(Device::Cpu.is_cpu());
        assert!(!Device::Cpu.is_cuda());
        assert!(Device::Cuda(0).is_cuda());
        assert!(Device::Sycl(2).is_sycl());
        assert_eq!(Device::Cuda(1).cuda_index(), Some(1));
        assert_eq!(Device::Cpu.cuda_index(), None);
        assert_eq!(Device::Sycl(3).index(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Device::Cpu), "CPU:0");
        assert_eq!(format!("{}", Device::Cuda(0)), "CUDA:0");
        assert_eq!(format!("{}", Device::Cuda(1000)), "CUDA:1000");
        assert_eq!(format!("{}", Device::Sycl(1)), "SYCL:1");
    }

    #[test]
    fn test_parse() {
        assert_eq!("CPU:0".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA:1000".parse::<Device>().unwrap(), Device::Cuda(1000));
        assert_eq!("cuda:2".parse::<Device>().unwrap(), Device::Cuda(2));
        assert_eq!("SYCL:0".parse::<Device>().unwrap(), Device::Sycl(0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "CUDA", "CPU:1", "TPU:0", "CUDA:-1", "CUDA:x"] {
            assert!(
                matches!(bad.parse::<Device>(), Err(GuardError::InvalidDevice(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn test_display_parse_agree() {
        for device in [Device::Cpu, Device::Cuda(0), Device::Cuda(7), Device::Sycl(1)] {
            assert_eq!(device.to_string().parse::<Device>().unwrap(), device);
        }
    }

    #[test]
    fn test_default() {
        assert_eq!(Device::default(), Device::Cpu);
    }
}
