pub mod matcher;
pub mod segmenter;

pub use matcher::{classify, same_supplier};
pub use segmenter::{parse_directory, segment, DirectoryField, SegmentError};
