use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub is_host: bool,
}

impl Participant {
    pub fn new(name: impl Into<String>, address: Option<String>) -> Self {
        Self {
            name: name.into(),
            address,
            is_host: false,
        }
    }

    /// Hosting requires a usable address; blank strings do not count.
    pub fn has_address(&self) -> bool {
        self.address
            .as_deref()
            .map(|address| !address.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_addresses_are_not_host_eligible() {
        assert!(!Participant::new("Ana", None).has_address());
        assert!(!Participant::new("Ben", Some("   ".to_string())).has_address());
        assert!(Participant::new("Cleo", Some("Canal St 5".to_string())).has_address());
    }
}
