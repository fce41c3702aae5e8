/// Zero-copy byte reader for decoding ECHONET Lite frames.
pub mod reader;
/// Byte writer for encoding ECHONET Lite frames into a caller-owned buffer.
pub mod writer;
