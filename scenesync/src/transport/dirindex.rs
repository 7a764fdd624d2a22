//! Parser for `.dirindex` directory listings served by scenery mirrors.
//!
//! One entry per line, `:`-separated:
//!
//! ```text
//! version:1
//! path:Terrain/e000n50
//! d:e008n53:4a1c...
//! f:3088961.stg:9b2e...:1290
//! ```
//!
//! `d` lines name subdirectories, `f` lines name files with their size in
//! bytes. Unknown line types are ignored.

use super::TransportError;

/// A file listed in a directory index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub name: String,
    pub hash: String,
    pub size: u64,
}

/// Parsed contents of a `.dirindex` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirIndex {
    pub dirs: Vec<String>,
    pub files: Vec<IndexedFile>,
}

impl DirIndex {
    /// Parse `text` as the listing of `dir`.
    pub fn parse(dir: &str, text: &str) -> Result<Self, TransportError> {
        let invalid = |reason: String| TransportError::InvalidListing {
            dir: dir.to_string(),
            reason,
        };

        let mut index = DirIndex::default();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(':').collect();
            match fields[0] {
                "d" => {
                    let name = fields
                        .get(1)
                        .ok_or_else(|| invalid(format!("line {}: missing name", line_no + 1)))?;
                    index.dirs.push(checked_name(name).map_err(&invalid)?);
                }
                "f" => {
                    if fields.len() < 4 {
                        return Err(invalid(format!(
                            "line {}: expected f:name:hash:size",
                            line_no + 1
                        )));
                    }
                    let size = fields[3].parse().map_err(|_| {
                        invalid(format!("line {}: bad size '{}'", line_no + 1, fields[3]))
                    })?;
                    index.files.push(IndexedFile {
                        name: checked_name(fields[1]).map_err(&invalid)?,
                        hash: fields[2].to_string(),
                        size,
                    });
                }
                _ => {}
            }
        }
        Ok(index)
    }
}

/// Reject names that would escape the directory being synced.
fn checked_name(name: &str) -> Result<String, String> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(format!("unsafe entry name '{}'", name));
    }
    Ok(name.to_string())
}
