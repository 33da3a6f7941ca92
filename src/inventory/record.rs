//! Line-oriented text encoding of the inventory.
//!
//! ```text
//! Filterunit Database File
//!
//! Filters:
//! 1,F1,glass,2;
//! End of filters
//!
//! Combinations:
//! C1,pair,0,2,F1,F2;
//! End of combinations
//!
//! End of file
//! ```
//!
//! Decoding is strict: a record either parses completely into a fresh
//! [`Inventory`] or fails with the offending line number.

use core::fmt::Write as _;

use super::{Filter, Inventory};
use crate::error::RecordError;

const HEADER: &str = "Filterunit Database File";
const FILTERS_BEGIN: &str = "Filters:";
const FILTERS_END: &str = "End of filters";
const COMBINATIONS_BEGIN: &str = "Combinations:";
const COMBINATIONS_END: &str = "End of combinations";
const FILE_END: &str = "End of file";

const SPLIT: char = ',';
const TERMINATOR: char = ';';

/// Render the full record.
pub fn encode(inventory: &Inventory) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{HEADER}");
    let _ = writeln!(out);
    let _ = writeln!(out, "{FILTERS_BEGIN}");
    for f in inventory.filters() {
        let _ = writeln!(out, "{},{},{},{};", f.slot, f.id, f.material, f.thickness);
    }
    let _ = writeln!(out, "{FILTERS_END}");
    let _ = writeln!(out);
    let _ = writeln!(out, "{COMBINATIONS_BEGIN}");
    for c in inventory.combinations() {
        let _ = write!(
            out,
            "{},{},{},{}",
            c.id,
            c.name,
            if c.placed { '1' } else { '0' },
            c.members.len()
        );
        for m in &c.members {
            let _ = write!(out, ",{m}");
        }
        let _ = writeln!(out, ";");
    }
    let _ = writeln!(out, "{COMBINATIONS_END}");
    let _ = writeln!(out);
    let _ = writeln!(out, "{FILE_END}");
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Filters,
    BetweenSections,
    Combinations,
    Trailer,
    Done,
}

/// Parse a record into a fresh inventory with the given drawer count.
pub fn decode(text: &str, capacity: u8) -> Result<Inventory, RecordError> {
    let mut inventory = Inventory::new(capacity);
    let mut section = Section::Preamble;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        let malformed = |reason| RecordError::Malformed { line: line_no, reason };

        section = match section {
            Section::Preamble => match line {
                FILTERS_BEGIN => Section::Filters,
                HEADER | "" => Section::Preamble,
                _ => return Err(malformed("unexpected text before filters")),
            },
            Section::Filters => {
                if line == FILTERS_END {
                    Section::BetweenSections
                } else {
                    let filter = parse_filter(line, capacity).map_err(malformed)?;
                    inventory
                        .restore_filter(filter)
                        .map_err(|_| malformed("duplicate filter or slot"))?;
                    Section::Filters
                }
            }
            Section::BetweenSections => match line {
                COMBINATIONS_BEGIN => Section::Combinations,
                "" => Section::BetweenSections,
                _ => return Err(malformed("expected combinations section")),
            },
            Section::Combinations => {
                if line == COMBINATIONS_END {
                    Section::Trailer
                } else {
                    let (id, name, placed, members) = parse_combination(line).map_err(malformed)?;
                    inventory
                        .add_combination(id, name, members)
                        .map_err(|_| malformed("duplicate combination or unknown member"))?;
                    if placed {
                        if inventory.placed_combination().is_some_and(|c| c.id != id) {
                            return Err(malformed("second placed combination"));
                        }
                        inventory
                            .set_placed(id, true)
                            .map_err(|_| malformed("combination vanished"))?;
                    }
                    Section::Combinations
                }
            }
            Section::Trailer => match line {
                FILE_END => Section::Done,
                "" => Section::Trailer,
                _ => return Err(malformed("expected end of file")),
            },
            Section::Done => {
                if line.is_empty() {
                    Section::Done
                } else {
                    return Err(malformed("text after end of file"));
                }
            }
        };
    }

    if section == Section::Done {
        Ok(inventory)
    } else {
        Err(RecordError::Malformed {
            line: text.lines().count(),
            reason: "record truncated",
        })
    }
}

fn strip_terminator(line: &str) -> Result<&str, &'static str> {
    line.strip_suffix(TERMINATOR)
        .ok_or("missing ';' terminator")
}

fn parse_filter(line: &str, capacity: u8) -> Result<Filter, &'static str> {
    let body = strip_terminator(line)?;
    let fields: Vec<&str> = body.split(SPLIT).collect();
    let [slot, id, material, thickness] = fields.as_slice() else {
        return Err("filter line needs 4 fields");
    };
    let slot: u8 = slot.parse().map_err(|_| "slot is not a number")?;
    if slot == 0 || slot > capacity {
        return Err("slot outside drawer range");
    }
    if [id, material, thickness].iter().any(|f| f.is_empty()) {
        return Err("empty filter field");
    }
    Ok(Filter {
        slot,
        id: (*id).to_owned(),
        material: (*material).to_owned(),
        thickness: (*thickness).to_owned(),
    })
}

fn parse_combination(line: &str) -> Result<(&str, &str, bool, Vec<String>), &'static str> {
    let body = strip_terminator(line)?;
    let fields: Vec<&str> = body.split(SPLIT).collect();
    let [id, name, placed, count, members @ ..] = fields.as_slice() else {
        return Err("combination line needs at least 4 fields");
    };
    let placed = match *placed {
        "0" => false,
        "1" => true,
        _ => return Err("placed flag must be 0 or 1"),
    };
    let count: usize = count.parse().map_err(|_| "member count is not a number")?;
    if count != members.len() {
        return Err("member count mismatch");
    }
    Ok((*id, *name, placed, members.iter().map(|m| (*m).to_owned()).collect()))
}
