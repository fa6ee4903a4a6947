//! Decoding, tensor assembly and anonymization of whole containers

pub mod anonymize;
pub mod builder;
pub mod decoder;

pub use anonymize::{anonymize_container, anonymize_header};
pub use builder::{ScanSet, TwixData, build_tensor, finalize};
pub use decoder::{ContainerLayout, decode_container};
