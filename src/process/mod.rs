pub mod batch;
pub mod convert;
pub mod date_parser;
pub mod decode;
pub mod reader;
pub mod unescape;

pub use batch::RowBatchBuilder;
pub use decode::RowDecoder;
pub use reader::DumpReader;
