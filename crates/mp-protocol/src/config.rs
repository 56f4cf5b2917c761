//! Channel configuration table
//!
//! Both ends of the link walk the same ordered table of modulation
//! variants. The table is loaded once at startup and never changes for
//! the lifetime of a run; slot timing maps elapsed time onto indices into
//! this table.

use crate::error::ProtocolError;

/// One candidate link configuration
///
/// The modulation parameters are what the transport programs into the
/// radio when this entry becomes active. `name` is a short grid label,
/// `description` a one-line human form shown on slot entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelConfig {
    /// Short label (fits a status-grid cell)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    /// Channel bandwidth in Hz
    pub bandwidth_hz: u32,
    /// LoRa spreading factor (7..=12)
    pub spreading_factor: u8,
}

impl ChannelConfig {
    /// Create a configuration entry
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        frequency_hz: u32,
        bandwidth_hz: u32,
        spreading_factor: u8,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            frequency_hz,
            bandwidth_hz,
            spreading_factor,
        }
    }
}

/// Ordered, non-empty table of channel configurations
///
/// Index order is the sweep order. Emptiness is rejected at construction
/// so the slot clock can divide by the table length unconditionally.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigTable {
    entries: Vec<ChannelConfig>,
    /// Display-layout hint: how many grid columns status renderers use.
    /// Not protocol-relevant.
    columns: usize,
}

impl ConfigTable {
    /// Create a table from entries
    ///
    /// Returns [`ProtocolError::EmptyConfigTable`] for an empty entry
    /// list. A zero `columns` hint is bumped to 1.
    pub fn new(entries: Vec<ChannelConfig>, columns: usize) -> Result<Self, ProtocolError> {
        if entries.is_empty() {
            return Err(ProtocolError::EmptyConfigTable);
        }
        Ok(Self {
            entries,
            columns: columns.max(1),
        })
    }

    /// The standard eight-entry sweep table
    ///
    /// Covers the useful SF/BW corners for an 868 MHz link, slowest last
    /// so the sweep starts on the configuration most likely to work.
    pub fn standard() -> Self {
        let entries = vec![
            ChannelConfig::new("7/125", "SF7 BW125", 868_100_000, 125_000, 7),
            ChannelConfig::new("8/125", "SF8 BW125", 868_100_000, 125_000, 8),
            ChannelConfig::new("9/125", "SF9 BW125", 868_100_000, 125_000, 9),
            ChannelConfig::new("10/125", "SF10 BW125", 868_100_000, 125_000, 10),
            ChannelConfig::new("7/250", "SF7 BW250", 868_300_000, 250_000, 7),
            ChannelConfig::new("9/250", "SF9 BW250", 868_300_000, 250_000, 9),
            ChannelConfig::new("11/125", "SF11 BW125", 868_100_000, 125_000, 11),
            ChannelConfig::new("12/125", "SF12 BW125", 868_100_000, 125_000, 12),
        ];
        // Table is non-empty by construction
        Self::new(entries, 4).expect("standard table is non-empty")
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; an empty table cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by index
    pub fn get(&self, index: usize) -> Option<&ChannelConfig> {
        self.entries.get(index)
    }

    /// Look up an entry, erroring on an out-of-range index
    pub fn require(&self, index: usize) -> Result<&ChannelConfig, ProtocolError> {
        self.entries
            .get(index)
            .ok_or(ProtocolError::InvalidConfigIndex {
                index,
                count: self.entries.len(),
            })
    }

    /// Iterate over entries in sweep order
    pub fn iter(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.entries.iter()
    }

    /// Display-layout hint for status renderers
    pub fn columns(&self) -> usize {
        self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_rejected() {
        let err = ConfigTable::new(Vec::new(), 4).unwrap_err();
        assert_eq!(err, ProtocolError::EmptyConfigTable);
    }

    #[test]
    fn test_standard_table() {
        let table = ConfigTable::standard();
        assert_eq!(table.len(), 8);
        assert_eq!(table.columns(), 4);
        assert_eq!(table.get(0).unwrap().spreading_factor, 7);
        assert!(table.get(table.len()).is_none());
    }

    #[test]
    fn test_require_out_of_range() {
        let table = ConfigTable::standard();
        let err = table.require(99).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidConfigIndex { index: 99, count: 8 }
        ));
    }

    #[test]
    fn test_zero_columns_bumped() {
        let table = ConfigTable::new(vec![ChannelConfig::new("a", "A", 1, 1, 7)], 0).unwrap();
        assert_eq!(table.columns(), 1);
    }
}
