use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "R"),
            AccessKind::Write => write!(f, "W"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceAccess {
    pub kind: AccessKind,
    pub address: u64,
}

#[derive(Debug, Clone)]
pub struct TraceFile {
    pub name: String,
    pub entries: Vec<TraceAccess>,
    pub skipped: usize,
}

impl TraceFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Unable to open trace file {}", path.display()))?;
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(name, BufReader::new(file))
            .with_context(|| format!("Failed to read trace file {}", path.display()))
    }

    /// Reads `<R|W> 0x<hex>` lines; anything else is skipped.
    pub fn parse(name: impl Into<String>, reader: impl BufRead) -> Result<Self> {
        let mut entries = Vec::new();
        let mut skipped = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read line from trace")?;
            match parse_line(&line) {
                Some(access) => entries.push(access),
                None => {
                    trace!("Skipping trace line {}: {:?}", idx + 1, line);
                    skipped += 1;
                }
            }
        }
        Ok(Self {
            name: name.into(),
            entries,
            skipped,
        })
    }
}

pub fn parse_line(line: &str) -> Option<TraceAccess> {
    let mut parts = line.split_whitespace();
    let kind = match parts.next()? {
        "R" => AccessKind::Read,
        "W" => AccessKind::Write,
        _ => return None,
    };
    let address = parse_address(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(TraceAccess { kind, address })
}

fn parse_address(token: &str) -> Option<u64> {
    let hex = token.strip_prefix("0x")?;
    if hex.is_empty() || hex.len() > 16 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(hex, 16).ok()
}
