//! Bounded-memory pattern scanning over large text exports.

use std::io::{self, Read};

use regex::bytes::Regex;

/// Counters from a completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub bytes_read: usize,
    pub matches: usize,
    /// Largest number of bytes held in memory at once.
    pub peak_window: usize,
}

/// Finds every match of a pattern in a stream without reading it whole.
///
/// Input is read `buffer_size` bytes at a time. After each read, matches that
/// can no longer grow are reported and the window is cut down to the
/// unconsumed tail, which stays under `2 * max_match_len` bytes. Matches that
/// straddle a read boundary are therefore reported exactly once, and memory
/// is bounded by `buffer_size + 2 * max_match_len` regardless of input size.
///
/// `max_match_len` must be at least the longest text the pattern can match.
#[derive(Debug)]
pub struct ChunkedScanner<'p> {
    pattern: &'p Regex,
    buffer_size: usize,
    max_match_len: usize,
}

impl<'p> ChunkedScanner<'p> {
    pub fn new(pattern: &'p Regex, buffer_size: usize, max_match_len: usize) -> Self {
        Self {
            pattern,
            buffer_size: buffer_size.max(1),
            max_match_len,
        }
    }

    /// Scans `reader` to the end, calling `on_match` with each match in order.
    pub fn scan<R, F>(&self, mut reader: R, mut on_match: F) -> io::Result<ScanStats>
    where
        R: Read,
        F: FnMut(&[u8]),
    {
        let mut stats = ScanStats::default();
        let mut chunk = vec![0u8; self.buffer_size];
        let mut window: Vec<u8> = Vec::with_capacity(self.buffer_size + 2 * self.max_match_len);

        loop {
            let n = match reader.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let eof = n == 0;
            stats.bytes_read += n;
            window.extend_from_slice(&chunk[..n]);
            stats.peak_window = stats.peak_window.max(window.len());

            // A match ending before `settled` already had `max_match_len`
            // bytes of lookahead, so more input cannot change it.
            let settled = if eof {
                window.len()
            } else {
                window.len().saturating_sub(self.max_match_len)
            };

            let mut consumed = 0;
            let mut pending_start = None;
            for m in self.pattern.find_iter(&window) {
                if m.end() > settled {
                    pending_start = Some(m.start());
                    break;
                }
                on_match(m.as_bytes());
                stats.matches += 1;
                consumed = m.end();
            }

            if eof {
                break;
            }

            let mut keep_from = consumed.max(settled);
            if let Some(start) = pending_start {
                keep_from = keep_from.min(start);
            }
            window.drain(..keep_from);
        }

        Ok(stats)
    }
}
