use tracing_subscriber::EnvFilter;

/// Truncates a string to a maximum length, adding `...` to the end if it was truncated.
///
/// The cut point is moved back until it lands on a UTF-8 character boundary.
///
/// # Arguments
/// * `string` - The string to truncate
/// * `max_length` - The maximum length of the string in bytes, including the `...`
pub fn truncate_string(string: &str, max_length: usize) -> String {
    if string.len() <= max_length {
        return string.to_string();
    }

    let mut cut = max_length.saturating_sub(3);
    while !string.is_char_boundary(cut) {
        cut -= 1;
    }

    format!("{}...", &string[..cut])
}

/// Logs to stderr so stdout only ever carries findings
///
/// Verbosity comes from `RUST_LOG`, defaulting to warnings.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
