pub mod encoder;
pub mod scratch;
pub mod storage;
