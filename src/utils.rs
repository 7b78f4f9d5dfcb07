// ###################################
// ->   Error format chain
// ###################################
/// Calls `Error::source()` on a chain of errors and joins them into a single line.
pub fn error_chain(e: &dyn std::error::Error) -> String {
    let mut out = e.to_string();
    let mut current_src = e.source();
    while let Some(cause) = current_src {
        out.push_str(" | caused by: ");
        out.push_str(&cause.to_string());
        current_src = cause.source();
    }

    out
}
