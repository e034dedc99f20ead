//! JSON edit scripts.
//!
//! A script is an array of operations applied in order:
//!
//! ```json
//! [
//!   {"op": "insert", "index": 0, "text": "hello"},
//!   {"op": "insert", "index": 5, "embed": "image", "value": "cat.png"},
//!   {"op": "format", "index": 0, "length": 5, "name": "bold", "value": true},
//!   {"op": "delete", "index": 1, "length": 2}
//! ]
//! ```

use anyhow::{Result, bail};
use folio_engine::{Host, Scroll};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Op {
    Insert {
        index: usize,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        embed: Option<String>,
        #[serde(default)]
        value: Value,
    },
    Delete {
        index: usize,
        length: usize,
    },
    Format {
        index: usize,
        length: usize,
        name: String,
        #[serde(default)]
        value: Value,
    },
}

pub fn parse(source: &str) -> Result<Vec<Op>> {
    Ok(serde_json::from_str(source)?)
}

/// Applies `ops` in order. Indices are checked against the current length
/// so a bad script fails instead of tripping the engine's assertions.
pub fn run<H: Host>(scroll: &mut Scroll<H>, ops: &[Op]) -> Result<()> {
    for (step, op) in ops.iter().enumerate() {
        debug!(step, ?op, "applying");
        let length = scroll.length();
        match op {
            Op::Insert {
                index,
                text,
                embed,
                value,
            } => {
                check_range(step, *index, 0, length)?;
                match (text, embed) {
                    (Some(text), None) => scroll.insert_text(*index, text)?,
                    (None, Some(kind)) => scroll.insert_embed(*index, kind, value.clone())?,
                    _ => bail!("step {step}: insert needs exactly one of `text` or `embed`"),
                }
            }
            Op::Delete { index, length: len } => {
                check_range(step, *index, *len, length)?;
                scroll.delete_at(*index, *len);
            }
            Op::Format {
                index,
                length: len,
                name,
                value,
            } => {
                check_range(step, *index, *len, length)?;
                scroll.format_at(*index, *len, name, value.clone())?;
            }
        }
    }
    Ok(())
}

fn check_range(step: usize, index: usize, length: usize, document: usize) -> Result<()> {
    if index.saturating_add(length) > document {
        bail!("step {step}: range {index}+{length} is past the document length {document}");
    }
    Ok(())
}
