//! Parsing the `(listfile)` name catalogue
//!
//! Archives carry no file names of their own; the conventional
//! `(listfile)` member is a plain text file with one name per line.

/// Splits listfile text into member names
///
/// Lines are separated by `\n` with optional `\r`; blank lines and `;`
/// comments are skipped. Names are taken as-is; the hasher normalises
/// case and separators at lookup time.
pub fn parse_listfile(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .map(str::to_string)
        .collect()
}
