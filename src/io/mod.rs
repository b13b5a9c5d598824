mod csv_io;
mod json_io;

pub use csv_io::{read_csv, read_csv_from_bytes, write_csv, write_csv_to};
pub use json_io::{summary_to_json, write_summary_json};
