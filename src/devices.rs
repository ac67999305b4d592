//! Resolution of device identity from advertisements and push topics

/// High byte of every sensorbox manufacturer ID
pub const COMPANY_ID_PREFIX: u16 = 0xF0;

/// Ordered list of recognised device names.
///
/// The first entry is the primary device, the rest are secondary ones.
/// Any number of devices is supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNames {
    names: Vec<String>,
}

impl DeviceNames {
    /// Build from names, skipping blanks and duplicates while keeping order
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !unique.iter().any(|n| n == name) {
                unique.push(name.to_string());
            }
        }

        Self { names: unique }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn primary(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Manufacturer ID a device advertises with: the prefix byte followed
    /// by the first character of its name
    pub fn manufacturer_id(name: &str) -> Option<u16> {
        let initial = *name.as_bytes().first()?;
        Some((COMPANY_ID_PREFIX << 8) | initial as u16)
    }

    /// First configured device whose initial matches the manufacturer ID
    pub fn by_manufacturer_id(&self, manufacturer_id: u16) -> Option<&str> {
        if manufacturer_id >> 8 != COMPANY_ID_PREFIX {
            return None;
        }

        let initial = (manufacturer_id & 0xff) as u8;
        self.names
            .iter()
            .find(|name| name.as_bytes().first() == Some(&initial))
            .map(String::as_str)
    }

    /// Device a push topic belongs to: the part before the first `/`
    pub fn by_topic(&self, topic: &str) -> Option<&str> {
        let name = topic.split('/').next().unwrap_or(topic);
        self.names
            .iter()
            .find(|n| n.as_str() == name)
            .map(String::as_str)
    }
}
