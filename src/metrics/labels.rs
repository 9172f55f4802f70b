//! Label types for Prometheus metrics

use prometheus_client::encoding::EncodeLabelSet;

use crate::config::Device;

/// Per-device label set
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DeviceLabels {
    pub device_id: String,
    pub device_name: String,
    pub ip_address: String,
    /// SNMP-style scrape instance, `{ip}:161`
    pub instance: String,
}

impl DeviceLabels {
    #[must_use]
    pub fn new(device_id: u32, device_name: &str, ip_address: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            device_name: device_name.to_string(),
            ip_address: ip_address.to_string(),
            instance: format!("{ip_address}:161"),
        }
    }
}

impl From<&Device> for DeviceLabels {
    fn from(device: &Device) -> Self {
        Self::new(device.id, &device.name, &device.address)
    }
}
