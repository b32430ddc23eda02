//! Symbolic message name lookup
//!
//! ASC traces may write a message name from the DBC instead of its numeric
//! identifier. The table maps those names back to identifiers.

use crate::database::dbc;
use crate::types::{DecoderError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Message name → CAN identifier table built from DBC files
#[derive(Debug, Clone, Default)]
pub struct MessageTable {
    /// Key: message name, Value: identifier as stored in the DBC
    ids_by_name: HashMap<String, u32>,
}

impl MessageTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from DBC content. Never fails: lines that are not
    /// message declarations are skipped.
    pub fn load<R: BufRead>(reader: R) -> Self {
        let mut table = Self::new();
        table.extend_from_reader(reader);
        table
    }

    /// Read a DBC file from disk and add its messages to the table
    ///
    /// Only opening the file can fail; the content itself is read leniently.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        log::info!("Loading DBC file: {:?}", path);

        let file = File::open(path).map_err(|e| {
            DecoderError::DbcParseError(format!("Failed to open {:?}: {}", path, e))
        })?;

        let added = self.extend_from_reader(BufReader::new(file));
        log::info!("Read {} messages from {:?}", added, path);
        Ok(added)
    }

    /// Add every message declaration found in `reader`, returning how many
    /// declarations were read. A later entry replaces an earlier one of the
    /// same name.
    pub fn extend_from_reader<R: BufRead>(&mut self, mut reader: R) -> usize {
        let mut added = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Stopped reading DBC content: {}", e);
                    break;
                }
            }

            let line = dbc::decode_line(&buf);
            if let Some((name, id)) = dbc::parse_message_line(&line) {
                log::trace!("[{}] {}", id, name);
                self.insert(name, id);
                added += 1;
            }
        }

        added
    }

    /// Add or replace a single entry
    pub fn insert(&mut self, name: impl Into<String>, id: u32) {
        self.ids_by_name.insert(name.into(), id);
    }

    /// Look up the identifier for a message name (exact, case-sensitive)
    pub fn resolve(&self, name: &str) -> Option<u32> {
        self.ids_by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids_by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids_by_name.is_empty()
    }

    /// Entries in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.ids_by_name
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
    }

    /// All entries sorted by identifier
    pub fn entries(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DBC: &str = "VERSION \"\"\n\
        \n\
        BU_: ECU1 ECU2\n\
        \n\
        BO_ 291 EngineData: 8 ECU1\n\
        \x20SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] \"rpm\" ECU2\n\
        \n\
        BO_ 1024 BrakeStatus: 4 ECU2\n\
        \x20SG_ BrakePressed : 0|1@1+ (1,0) [0|1] \"\" ECU1\n";

    #[test]
    fn test_empty_table() {
        let table = MessageTable::new();
        assert!(table.is_empty());
        assert_eq!(table.resolve("EngineData"), None);
    }

    #[test]
    fn test_load_messages() {
        let table = MessageTable::load(Cursor::new(DBC));
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve("EngineData"), Some(291));
        assert_eq!(table.resolve("BrakeStatus"), Some(1024));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let table = MessageTable::load(Cursor::new(DBC));
        assert_eq!(table.resolve("enginedata"), None);
        assert_eq!(table.resolve("EngineData:"), None);
    }

    #[test]
    fn test_last_declaration_wins() {
        let content = "BO_ 1 Dup: 8 A\nBO_ 2 Dup: 8 B\n";
        let table = MessageTable::load(Cursor::new(content));
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve("Dup"), Some(2));
    }

    #[test]
    fn test_extend_counts_declarations() {
        let mut table = MessageTable::load(Cursor::new(DBC));
        let added = table.extend_from_reader(Cursor::new("BO_ 291 Other: 8 X\n"));
        assert_eq!(added, 1);
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.entries(),
            vec![("EngineData", 291), ("Other", 291), ("BrakeStatus", 1024)]
        );
    }

    #[test]
    fn test_non_utf8_content_is_read() {
        let content: &[u8] = b"CM_ \"Temperatur in \xB0C\";\nBO_ 5 Temp: 2 ECU\n";
        let table = MessageTable::load(Cursor::new(content));
        assert_eq!(table.resolve("Temp"), Some(5));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut table = MessageTable::new();
        let result = table.load_file(Path::new("/nonexistent/dir/missing.dbc"));
        assert!(matches!(result, Err(DecoderError::DbcParseError(_))));
    }
}
