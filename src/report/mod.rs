mod tables;

pub use tables::{
    format_estimate_table, print_estimate_table,
    format_fit_table, print_fit_table,
    format_duration,
};
