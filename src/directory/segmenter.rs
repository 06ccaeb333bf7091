//! Splits the flat text of a vendor-directory PDF into supplier blocks.
//!
//! Every block carries the same labels in the same reading order:
//!
//! ```text
//! Vendor .. Representative .. Address .. Telephone # .. Fax # .. Email .. Website .. (Bid | RFP | end)
//! ```
//!
//! The text between two labels is the value of the first one. Blocks keep coming
//! while a `Bid` label is still ahead of the cursor.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::crawler::models::{SupplierContact, SupplierEntry};

const FIRST_ANCHOR: &str = "Vendor";
const FALLBACK_ANCHOR: &str = "RFP";
const BLOCK_GATE: &str = "Bid";
const WEBSITE_SCHEME: &str = "https://";

static BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)Vendor(?P<suppliers>.*?)Representative(?P<name>.*?)Address(?P<address>.*?)Telephone #(?P<phone>.*?)Fax #.*?Email(?P<email>.*?)Website",
    )
    .expect("supplier block pattern")
});

/// Labelled fields of one directory block, in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryField {
    Vendor,
    Representative,
    Address,
    Telephone,
    Fax,
    Email,
    Website,
}

impl DirectoryField {
    const ORDER: [DirectoryField; 7] = [
        DirectoryField::Vendor,
        DirectoryField::Representative,
        DirectoryField::Address,
        DirectoryField::Telephone,
        DirectoryField::Fax,
        DirectoryField::Email,
        DirectoryField::Website,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DirectoryField::Vendor => "Vendor",
            DirectoryField::Representative => "Representative",
            DirectoryField::Address => "Address",
            DirectoryField::Telephone => "Telephone #",
            DirectoryField::Fax => "Fax #",
            DirectoryField::Email => "Email",
            DirectoryField::Website => "Website",
        }
    }
}

impl fmt::Display for DirectoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("directory block {block} starting at byte {offset} has no `{field}` label")]
    MissingMarker {
        field: DirectoryField,
        block: usize,
        offset: usize,
    },
}

impl SegmentError {
    pub fn field(&self) -> DirectoryField {
        match self {
            SegmentError::MissingMarker { field, .. } => *field,
        }
    }
}

/// Lazy sequence of supplier blocks. Stops after the first error.
pub struct DirectoryBlocks<'a> {
    text: &'a str,
    cursor: Option<usize>,
    emitted: usize,
}

pub fn segment(text: &str) -> DirectoryBlocks<'_> {
    let cursor = text
        .find(FIRST_ANCHOR)
        .or_else(|| text.find(FALLBACK_ANCHOR));

    DirectoryBlocks {
        text,
        cursor,
        emitted: 0,
    }
}

/// Collects every block, failing on the first malformed one.
pub fn parse_directory(text: &str) -> Result<Vec<SupplierEntry>, SegmentError> {
    segment(text).collect()
}

impl<'a> Iterator for DirectoryBlocks<'a> {
    type Item = Result<SupplierEntry, SegmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor?;
        let text = self.text;

        if !text[cursor..].contains(BLOCK_GATE) {
            self.cursor = None;
            return None;
        }

        let Some(caps) = BLOCK.captures_at(text, cursor) else {
            self.cursor = None;
            return missing_marker(text, cursor, self.emitted).map(Err);
        };

        let website_start = caps.get(0).map(|m| m.end()).unwrap_or(text.len());
        let rest = &text[website_start..];
        let terminator = rest
            .find(BLOCK_GATE)
            .or_else(|| rest.find(FALLBACK_ANCHOR))
            .map(|i| website_start + i);
        let website = clean(&text[website_start..terminator.unwrap_or(text.len())]);

        let field = |name: &str| caps.name(name).map(|m| clean(m.as_str())).unwrap_or_default();

        let entry = SupplierEntry {
            suppliers: field("suppliers"),
            contact: SupplierContact {
                name: field("name"),
                address: field("address"),
                phone: field("phone"),
                email: field("email"),
                website: format!("{WEBSITE_SCHEME}{website}"),
            },
        };

        self.cursor = terminator;
        self.emitted += 1;
        Some(Ok(entry))
    }
}

/// Finds the first label missing after `cursor`. Past the first block a missing
/// `Vendor` label means no further block starts, which ends the sequence
/// cleanly. Before any block it means the directory has no usable layout.
fn missing_marker(text: &str, cursor: usize, block: usize) -> Option<SegmentError> {
    let offset = match text[cursor..].find(FIRST_ANCHOR) {
        Some(i) => cursor + i,
        None if block == 0 => {
            return Some(SegmentError::MissingMarker {
                field: DirectoryField::Vendor,
                block,
                offset: cursor,
            })
        }
        None => return None,
    };
    let mut pos = offset;

    for field in DirectoryField::ORDER.into_iter().skip(1) {
        match text[pos..].find(field.label()) {
            Some(i) => pos += i,
            None => {
                return Some(SegmentError::MissingMarker {
                    field,
                    block,
                    offset,
                })
            }
        }
    }

    None
}

fn clean(raw: &str) -> String {
    raw.replace(['\n', '\r'], "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(vendor: &str, rep: &str, site: &str) -> String {
        format!(
            "Vendor\n{vendor}\nRepresentative\n{rep}\nAddress\n10 Main Street\nSuite 4\n\
             Telephone #\n 732-555-0100 \nFax #\n732-555-0101\nEmail\n{rep}@example.com\n\
             Website\n{site}\nBid\n"
        )
    }

    #[test]
    fn yields_one_entry_per_bid_terminated_block() {
        let text = format!(
            "RFP #22/23-14 Athletic Supplies\n{}{}{}",
            block("Acme Sports", "jane", "www.acme.com"),
            block("Beta-Gear Inc", "omar", "betagear.com"),
            block("Gamma LLC", "li", "gamma.net"),
        );

        let entries = parse_directory(&text).unwrap();
        assert_eq!(entries.len(), 3);

        let first = &entries[0];
        assert_eq!(first.suppliers, "Acme Sports");
        assert_eq!(first.contact.name, "jane");
        assert_eq!(first.contact.address, "10 Main StreetSuite 4");
        assert_eq!(first.contact.phone, "732-555-0100");
        assert_eq!(first.contact.email, "jane@example.com");
        assert_eq!(first.contact.website, "https://www.acme.com");

        assert_eq!(entries[1].suppliers, "Beta-Gear Inc");
        assert_eq!(entries[2].contact.website, "https://gamma.net");
    }

    #[test]
    fn segmentation_is_deterministic() {
        let text = format!(
            "{}{}",
            block("Acme Sports", "jane", "acme.com"),
            block("Delta Co", "sam", "delta.com")
        );
        assert_eq!(parse_directory(&text), parse_directory(&text));
    }

    #[test]
    fn last_block_may_run_to_end_of_text() {
        let text = "Vendor Acme Representative Jane Address 1 Road Telephone # 1 Fax # 2 \
                    Email a@b.c Website acme.com Bid\nVendor Zed Representative Zoe \
                    Address 2 Road Telephone # 3 Fax # 4 Email z@b.c Website zed.com";

        let entries = parse_directory(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].contact.website, "https://zed.com");
    }

    #[test]
    fn website_stops_at_rfp_when_no_bid_follows() {
        let text = "Vendor Bidwell Supply Representative Jane Address 1 Road Telephone # 1 \
                    Fax # 2 Email a@b.c Website bidwell.com RFP 23-01";
        let entries = parse_directory(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].suppliers, "Bidwell Supply");
        assert_eq!(entries[0].contact.website, "https://bidwell.com");
    }

    #[test]
    fn text_without_anchor_is_empty() {
        assert!(parse_directory("nothing to see here, Bid").unwrap().is_empty());
        assert!(parse_directory("").unwrap().is_empty());
    }

    #[test]
    fn rfp_heading_without_vendor_label_is_malformed() {
        let text = "RFP #22/23-14 Athletic Supplies\nBid tabulation to follow";
        assert_eq!(
            parse_directory(text),
            Err(SegmentError::MissingMarker {
                field: DirectoryField::Vendor,
                block: 0,
                offset: 0,
            })
        );
    }

    #[test]
    fn trailing_bid_text_after_last_block_ends_cleanly() {
        let text = format!(
            "{}Bid opening notes without further suppliers",
            block("Acme Sports", "jane", "www.acme.com")
        );
        let entries = parse_directory(&text).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn text_without_bid_gate_is_empty() {
        let text = "Vendor Acme Representative Jane Address 1 Road Telephone # 1 Fax # 2 \
                    Email a@b.c Website acme.com";
        assert!(parse_directory(text).unwrap().is_empty());
    }

    #[test]
    fn reports_the_missing_label() {
        let text = "Vendor Acme Representative Jane Address 1 Road Fax # 2 \
                    Email a@b.c Website acme.com Bid";

        let err = parse_directory(text).unwrap_err();
        assert_eq!(err.field(), DirectoryField::Telephone);
        assert!(err.to_string().contains("Telephone #"));
    }

    #[test]
    fn blocks_before_a_malformed_one_are_still_yielded_lazily() {
        let text = format!(
            "{}Vendor Broken Representative Bob Address nowhere Bid",
            block("Acme Sports", "jane", "acme.com")
        );

        let mut blocks = segment(&text);
        assert!(blocks.next().unwrap().is_ok());
        let err = blocks.next().unwrap().unwrap_err();
        assert_eq!(err.field(), DirectoryField::Telephone);
        assert!(blocks.next().is_none());
    }
}
