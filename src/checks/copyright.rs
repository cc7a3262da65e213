//! Current-year copyright header check

use super::exclusions::Exclusions;
use super::{ArchiveEntry, Snapshot, findings_result};
use crate::core::error::DevResult;
use chrono::Datelike;
use regex::Regex;
use std::path::Path;

pub const DEFAULT_HOLDER: &str = "Columnar Technologies Inc";

/// Lines searched for the header at the top of each file
const HEADER_LINES: usize = 2;

/// `Copyright (c) [YYYY-]<year> <holder>. All rights reserved.`
pub fn header_regex(year: i32, holder: &str) -> DevResult<Regex> {
  Ok(Regex::new(&format!(
    r"Copyright \(c\) ([0-9]+-)?{} {}\.? +All rights reserved\.",
    year,
    regex::escape(holder)
  ))?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyrightFinding {
  MissingHeader(String),
  Unreadable(String),
}

impl std::fmt::Display for CopyrightFinding {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      CopyrightFinding::MissingHeader(name) => write!(f, "Missing copyright header in {}", name),
      CopyrightFinding::Unreadable(name) => write!(f, "Cannot read {} as text, skipping", name),
    }
  }
}

/// Check every non-empty, non-excluded file
pub fn scan(entries: &[ArchiveEntry], exclusions: &Exclusions, header: &Regex) -> Vec<CopyrightFinding> {
  entries
    .iter()
    .filter(|entry| !entry.data.is_empty() && !exclusions.is_excluded(&entry.name))
    .filter_map(|entry| match entry.head_lines(HEADER_LINES) {
      None => Some(CopyrightFinding::Unreadable(entry.name.clone())),
      Some(lines) if lines.iter().any(|line| header.is_match(line)) => None,
      Some(_) => Some(CopyrightFinding::MissingHeader(entry.name.clone())),
    })
    .collect()
}

/// Check the repository at `root`, printing each finding
pub fn run(root: &Path, holder: &str) -> DevResult<()> {
  let exclusions = Exclusions::load(root)?;
  let snapshot = Snapshot::capture(root)?;
  let header = header_regex(chrono::Local::now().year(), holder)?;

  let findings = scan(&snapshot.entries()?, &exclusions, &header);
  for finding in &findings {
    println!("{}", finding);
  }
  findings_result("Copyright", findings.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(name: &str, content: &str) -> ArchiveEntry {
    ArchiveEntry {
      name: name.to_string(),
      data: content.as_bytes().to_vec(),
    }
  }

  #[test]
  fn test_header_regex() {
    let re = header_regex(2025, DEFAULT_HOLDER).unwrap();
    assert!(re.is_match("// Copyright (c) 2025 Columnar Technologies Inc.  All rights reserved."));
    assert!(re.is_match("# Copyright (c) 2023-2025 Columnar Technologies Inc. All rights reserved."));
    assert!(re.is_match("Copyright (c) 2025 Columnar Technologies Inc All rights reserved."));
    assert!(!re.is_match("// Copyright (c) 2024 Columnar Technologies Inc. All rights reserved."));
  }

  #[test]
  fn test_scan() {
    let re = header_regex(2025, DEFAULT_HOLDER).unwrap();
    let entries = vec![
      entry("ok.go", "// Copyright (c) 2025 Columnar Technologies Inc. All rights reserved.\npackage x\n"),
      entry("second_line.py", "#!/usr/bin/env python3\n# Copyright (c) 2025 Columnar Technologies Inc. All rights reserved.\n"),
      entry("third_line.py", "#!/usr/bin/env python3\n\n# Copyright (c) 2025 Columnar Technologies Inc. All rights reserved.\n"),
      entry("empty.txt", ""),
      entry("logo.png", "\u{0}"),
      entry("README.md", "# Driver\n"),
    ];
    let mut binary = entry("blob.bin", "");
    binary.data = vec![0xff, 0xfe, 0x00];
    let mut all = entries;
    all.push(binary);

    let exclusions = Exclusions::new(&["*.png".to_string()]);
    let findings = scan(&all, &exclusions, &re);
    assert_eq!(
      findings,
      [
        CopyrightFinding::MissingHeader("third_line.py".into()),
        CopyrightFinding::MissingHeader("README.md".into()),
        CopyrightFinding::Unreadable("blob.bin".into()),
      ]
    );
  }
}
