//! Small helpers shared by the client and the CLI.

mod data_uri;

pub use data_uri::{mime_for_filename, to_data_uri};
