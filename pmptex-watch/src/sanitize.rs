//! Filename sanitization for untrusted drop names
//!
//! Drop names come from an external workflow and may contain line breaks,
//! control characters or separators; they are used as local paths, so they
//! get scrubbed before touching the filesystem.

/// Fallback when sanitization leaves nothing usable
const DEFAULT_STUB: &str = "arquivo.xlsx";

/// Characters Windows refuses in filenames (plus path separators)
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Scrub an untrusted filename into a safe local `.xlsx` name.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '\r' | '\n' | '\t' => ' ',
            c if (c as u32) < 0x20 => '_',
            c if FORBIDDEN.contains(&c) => '_',
            c => c,
        })
        .collect();

    // Collapse whitespace runs and trim the ends
    let mut clean = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if clean.is_empty() {
        clean = DEFAULT_STUB.to_string();
    }
    if !clean.to_lowercase().ends_with(".xlsx") {
        clean.push_str(".xlsx");
    }
    clean
}
