use dircompare_common::{DirCompareError, FileDiff, FileDiffLine, LineStatus};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::path::Path;
use tracing::debug;

const COMPARE_BUFFER_SIZE: usize = 64 * 1024;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Position-aligned line comparison of two optional files.
///
/// Line `i` on the left is compared with line `i` on the right. Inserted or
/// deleted blocks therefore show up as a run of modified lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileComparator;

impl FileComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare two optional files; an absent or missing side reads as empty
    pub fn compare_files(
        &self,
        left: Option<&Path>,
        right: Option<&Path>,
    ) -> Result<FileDiff, DirCompareError> {
        let left_lines = read_lines(left)?;
        let right_lines = read_lines(right)?;
        Ok(self.compare_lines(&left_lines, &right_lines))
    }

    pub fn compare_text(&self, left: &str, right: &str) -> FileDiff {
        self.compare_lines(&split_lines(left), &split_lines(right))
    }

    pub fn compare_lines<S: AsRef<str>>(&self, left: &[S], right: &[S]) -> FileDiff {
        let max_len = left.len().max(right.len());
        let mut diff = FileDiff::empty();
        diff.lines.reserve(max_len);

        for i in 0..max_len {
            let left_line = left.get(i).map(|l| l.as_ref());
            let right_line = right.get(i).map(|r| r.as_ref());

            let status = match (left_line, right_line) {
                (None, _) => {
                    diff.added += 1;
                    LineStatus::Added
                }
                (_, None) => {
                    diff.removed += 1;
                    LineStatus::Removed
                }
                (Some(l), Some(r)) if l != r => {
                    diff.modified += 1;
                    LineStatus::Modified
                }
                (Some(_), Some(_)) => LineStatus::Identical,
            };

            diff.lines.push(FileDiffLine {
                left: left_line.map(str::to_string),
                right: right_line.map(str::to_string),
                status,
            });
        }

        diff.percentage = change_percentage(diff.added + diff.removed + diff.modified, max_len);
        diff
    }
}

fn change_percentage(changed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        changed as f64 / total as f64 * 100.0
    }
}

/// Read and decode a file into lines; `None` or a vanished path yields no lines
pub fn read_lines(path: Option<&Path>) -> Result<Vec<String>, DirCompareError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };

    match fs::read(path) {
        Ok(bytes) => Ok(split_lines(&decode_text(&bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{:?} disappeared before reading, treating as absent", path);
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Decode bytes as text: UTF-8, then BOM-marked UTF-16, then ISO-8859-1.
///
/// The last step maps every byte to one char, so decoding never fails.
pub fn decode_text(bytes: &[u8]) -> String {
    decode_utf8(bytes)
        .or_else(|| decode_utf16(bytes))
        .unwrap_or_else(|| decode_latin1(bytes))
}

fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (body, from_bytes): (&[u8], fn([u8; 2]) -> u16) =
        if let Some(body) = bytes.strip_prefix(&UTF16_LE_BOM) {
            (body, u16::from_le_bytes)
        } else if let Some(body) = bytes.strip_prefix(&UTF16_BE_BOM) {
            (body, u16::from_be_bytes)
        } else {
            return None;
        };

    if body.len() % 2 != 0 {
        return None;
    }

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| from_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Byte-for-byte comparison of two files
pub fn contents_equal(left: &Path, right: &Path) -> Result<bool, DirCompareError> {
    if fs::metadata(left)?.len() != fs::metadata(right)?.len() {
        return Ok(false);
    }

    let mut left_file = File::open(left)?;
    let mut right_file = File::open(right)?;
    let mut left_buf = vec![0u8; COMPARE_BUFFER_SIZE];
    let mut right_buf = vec![0u8; COMPARE_BUFFER_SIZE];

    loop {
        let n = fill_buffer(&mut left_file, &mut left_buf)?;
        let m = fill_buffer(&mut right_file, &mut right_buf)?;
        if left_buf[..n] != right_buf[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

fn fill_buffer(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Split on `\n`, `\r\n` or a lone `\r`; a trailing terminator adds no empty line
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => lines.push(std::mem::take(&mut current)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
