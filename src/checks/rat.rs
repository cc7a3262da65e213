//! License audit: Apache RAT plus the ADBC header rules
//!
//! RAT flags files without an approved license. On top of that every file
//! needs an `ADBC Drivers Contributors` copyright line near the top, and the
//! "modified from its original version" Apache header must appear exactly on
//! the files listed in `.rat-apache`.

use super::exclusions::{self, Exclusions};
use super::{ArchiveEntry, Snapshot, findings_result};
use crate::core::error::{DevError, DevResult, ResultExt};
use crate::core::process::ToolCommand;
use crate::ui::progress::DownloadProgress;
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const RAT_VERSION: &str = "0.16.1";

const HEADER_SCAN_LINES: usize = 20;
const COPYRIGHT_PATTERN: &str = r"Copyright \(c\) [0-9]{4} ADBC Drivers Contributors";
const APACHE_HEADER_PATTERN: &str = "This file has been modified from its original version, which is under the Apache \
   License: Licensed to the Apache Software Foundation";
const SEPARATOR_PATTERN: &str = r"[^a-zA-Z0-9,:()]+";

fn rat_url() -> String {
  format!(
    "https://repo1.maven.org/maven2/org/apache/rat/apache-rat/{0}/apache-rat-{0}.jar",
    RAT_VERSION
  )
}

/// Cache directory for downloaded tools
pub fn cache_dir() -> DevResult<PathBuf> {
  let base = dirs::cache_dir().ok_or_else(|| DevError::message("Could not determine the user cache directory"))?;
  Ok(base.join("adbc-drivers-dev"))
}

/// Path of the RAT jar, downloading it on first use
pub fn ensure_rat_jar(cache: &Path) -> DevResult<PathBuf> {
  fs::create_dir_all(cache).with_context(|| format!("Failed to create {}", cache.display()))?;
  let jar = cache.join(format!("apache-rat-{}.jar", RAT_VERSION));
  if jar.is_file() {
    return Ok(jar);
  }

  let url = rat_url();
  info!("Downloading {}", url);
  let partial = jar.with_extension("jar.part");
  match download(&url, &partial) {
    Ok(()) => {
      fs::rename(&partial, &jar).with_context(|| format!("Failed to move download to {}", jar.display()))?;
      Ok(jar)
    }
    Err(e) => {
      let _ = fs::remove_file(&partial);
      Err(e.context(format!("Failed to download Apache RAT from {}", url)))
    }
  }
}

fn download(url: &str, dest: &Path) -> DevResult<()> {
  let mut response = reqwest::blocking::get(url)?.error_for_status()?;
  let mut progress = response
    .content_length()
    .map(|len| DownloadProgress::new(len as usize, format!("apache-rat-{}.jar", RAT_VERSION)));

  let mut sink = File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
  let mut buf = [0u8; 8192];
  loop {
    let read = match response.read(&mut buf) {
      Ok(0) => break,
      Ok(n) => n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e.into()),
    };
    sink.write_all(&buf[..read])?;
    if let Some(progress) = progress.as_mut() {
      progress.inc(read);
    }
  }
  sink.flush()?;
  Ok(())
}

/// Resources RAT did not approve, minus exclusions
pub fn unapproved_resources(report_xml: &str, exclusions: &Exclusions) -> DevResult<Vec<String>> {
  let doc = roxmltree::Document::parse(report_xml)?;
  let mut unapproved = Vec::new();
  for resource in doc.root_element().children().filter(|n| n.has_tag_name("resource")) {
    let Some(approval) = resource.children().find(|n| n.has_tag_name("license-approval")) else {
      continue;
    };
    if approval.attribute("name") == Some("true") {
      continue;
    }
    let name = resource.attribute("name").unwrap_or_default();
    if exclusions.is_excluded(name) {
      debug!("Ignoring excluded resource {}", name);
      continue;
    }
    unapproved.push(name.to_string());
  }
  Ok(unapproved)
}

/// Problems found by the header scan
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HeaderFindings {
  pub missing_copyright: Vec<String>,
  pub missing_apache_header: Vec<String>,
  pub unexpected_apache_header: Vec<String>,
}

impl HeaderFindings {
  pub fn total(&self) -> usize {
    self.missing_copyright.len() + self.missing_apache_header.len() + self.unexpected_apache_header.len()
  }
}

/// Compiled header patterns
pub struct HeaderRules {
  copyright: Regex,
  apache: Regex,
  separators: Regex,
}

impl HeaderRules {
  pub fn new() -> DevResult<Self> {
    Ok(Self {
      copyright: Regex::new(COPYRIGHT_PATTERN)?,
      apache: Regex::new(&regex::escape(APACHE_HEADER_PATTERN))?,
      separators: Regex::new(SEPARATOR_PATTERN)?,
    })
  }

  /// Leading lines with comment markers and line breaks collapsed to spaces
  fn normalized_head(&self, entry: &ArchiveEntry) -> String {
    let head = entry
      .head_lines(HEADER_SCAN_LINES)
      .map(|lines| lines.join(" "))
      .unwrap_or_default();
    self.separators.replace_all(&head, " ").into_owned()
  }

  pub fn scan(&self, entries: &[ArchiveEntry], exclusions: &Exclusions, apache_files: &HashSet<String>) -> HeaderFindings {
    let mut findings = HeaderFindings::default();
    for entry in entries {
      let content = self.normalized_head(entry);

      let exempt = entry.name.ends_with("LICENSE.txt")
        || entry.name.ends_with("NOTICE.txt")
        || exclusions.is_excluded(&entry.name);
      if !exempt && !self.copyright.is_match(&content) {
        findings.missing_copyright.push(entry.name.clone());
      }

      let has_apache_header = self.apache.is_match(&content);
      if apache_files.contains(&entry.name) {
        if !has_apache_header {
          findings.missing_apache_header.push(entry.name.clone());
        }
      } else if has_apache_header {
        findings.unexpected_apache_header.push(entry.name.clone());
      }
    }
    findings
  }
}

fn print_section(title: &str, names: &[String]) {
  if names.is_empty() {
    return;
  }
  println!("{}", title);
  for name in names {
    println!("- {}", name);
  }
}

/// Audit the repository at `root`, printing each finding
pub fn run(root: &Path) -> DevResult<()> {
  println!("Checking licenses for {}", root.display());
  let jar = ensure_rat_jar(&cache_dir()?)?;
  println!("Using Apache RAT: {}", jar.display());

  let exclusions = Exclusions::load(root)?;
  let apache_files: HashSet<String> = exclusions::read_list(&root.join(exclusions::APACHE_FILE))?
    .into_iter()
    .collect();
  let snapshot = Snapshot::capture(root)?;

  let report = ToolCommand::new("java")
    .arg("-jar")
    .arg(jar.to_string_lossy())
    .arg(snapshot.archive_path().to_string_lossy())
    .arg("-x")
    .output()?;
  let unapproved = unapproved_resources(&report, &exclusions)?;
  print_section("Files without licenses or with unapproved licenses found:", &unapproved);

  let headers = HeaderRules::new()?.scan(&snapshot.entries()?, &exclusions, &apache_files);
  print_section(
    "Files missing ADBC Drivers Contributors copyright header:",
    &headers.missing_copyright,
  );
  print_section(
    "Files missing 'This file has been modified' header:",
    &headers.missing_apache_header,
  );
  print_section(
    "Files that should not have 'This file has been modified' header:",
    &headers.unexpected_apache_header,
  );

  findings_result("License", unapproved.len() + headers.total())
}
