mod checksum;

pub use checksum::{is_sha256_hex, sha256_file_hex, sha256_hex};
