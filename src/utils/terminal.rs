//! Terminal output utilities

use console::style;

/// Print the one-line status of a successful run
pub fn print_status(message: &str) {
    println!("{}", style(message).green());
}

/// Print a one-line error prefixed with the program name
pub fn print_error(program_name: &str, message: &str) {
    eprintln!("{}: {}", style(program_name).red().bold(), message);
}

/// Human-readable byte count
pub fn format_size(size_bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size_bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}
