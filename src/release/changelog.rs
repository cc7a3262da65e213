//! Release notes from conventional commit titles
//!
//! Commits between two refs are filtered to those touching the driver's
//! subdirectory, classified by their title, and rendered as Markdown: one
//! section per user-facing category followed by the full commit list.

use crate::core::error::{DevError, DevResult};
use crate::core::vcs::{CommitInfo, GitRepository};
use crate::utils::path_has_prefix;
use chrono::{NaiveDate, Utc};
use std::fmt;
use tracing::debug;

/// Changelog categories, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
  Feat,
  Fix,
  Perf,
  Docs,
  Other,
}

impl Category {
  /// Map a commit type (`feat`, `fix`, ...) to its category
  pub fn from_type(commit_type: &str) -> Self {
    match commit_type.to_lowercase().as_str() {
      "feat" | "feature" => Self::Feat,
      "fix" => Self::Fix,
      "perf" | "performance" => Self::Perf,
      "docs" | "doc" => Self::Docs,
      _ => Self::Other,
    }
  }

  /// Section heading, `None` for categories that only appear in the detailed list
  pub fn heading(&self) -> Option<&'static str> {
    match self {
      Self::Feat => Some("New Features"),
      Self::Fix => Some("Bug Fixes"),
      Self::Perf => Some("Performance Improvements"),
      Self::Docs => Some("Documentation Updates"),
      Self::Other => None,
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Feat => "feat",
      Self::Fix => "fix",
      Self::Perf => "perf",
      Self::Docs => "docs",
      Self::Other => "other",
    };
    f.write_str(name)
  }
}

/// A parsed `<type>(<scope>)!: <subject>` title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalTitle {
  pub commit_type: String,
  /// Components in parentheses, e.g. `go` or `go, rust`
  pub scope: Option<String>,
  pub breaking: bool,
  pub subject: String,
}

impl ConventionalTitle {
  /// Parse the first line of a commit message
  ///
  /// Returns None if the title doesn't follow the conventional format.
  pub fn parse(title: &str) -> Option<Self> {
    use winnow::ascii::{alphanumeric1, space0};
    use winnow::combinator::{opt, preceded, terminated};
    use winnow::prelude::*;
    use winnow::token::take_till;

    let first_line = title.lines().next().unwrap_or_default();

    let mut parser = (
      alphanumeric1::<_, ()>,
      opt(preceded('(', terminated(take_till(1.., ')'), ')'))),
      opt('!'),
      ':',
      space0,
      take_till(0.., ['\n', '\r']),
    );

    let Ok((commit_type, scope, bang, _, _, subject)) = parser.parse(first_line) else {
      return None;
    };

    let subject = subject.trim();
    if subject.is_empty() {
      return None;
    }

    Some(Self {
      commit_type: commit_type.to_string(),
      scope: scope.map(|s: &str| s.trim().to_string()),
      breaking: bang.is_some(),
      subject: subject.to_string(),
    })
  }
}

/// Decides the category and display subject of a commit title
pub trait CommitClassifier {
  fn classify(&self, title: &str) -> (Category, String);
}

/// Conventional-commit classifier; unparseable titles go to `Other` verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionalClassifier;

impl CommitClassifier for ConventionalClassifier {
  fn classify(&self, title: &str) -> (Category, String) {
    match ConventionalTitle::parse(title) {
      Some(parsed) => (Category::from_type(&parsed.commit_type), parsed.subject),
      None => (Category::Other, title.trim().to_string()),
    }
  }
}

/// One included commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
  pub category: Category,
  pub subject: String,
  pub short_hash: String,
  /// First line of the commit message
  pub title: String,
}

/// A rendered-on-demand changelog
#[derive(Debug, Clone)]
pub struct Changelog {
  pub driver_name: String,
  pub version: String,
  pub date: NaiveDate,
  /// Newest first
  pub entries: Vec<ChangelogEntry>,
}

impl Changelog {
  /// `<driver> <version> (<YYYY-MM-DD>)`
  pub fn title(&self) -> String {
    format!("{} {} ({})", self.driver_name, self.version, self.date.format("%Y-%m-%d"))
  }

  /// Markdown body, trailing whitespace trimmed
  pub fn body(&self) -> String {
    let mut lines: Vec<String> = Vec::new();

    for category in [Category::Feat, Category::Fix, Category::Perf, Category::Docs] {
      let Some(heading) = category.heading() else {
        continue;
      };
      let entries: Vec<&ChangelogEntry> = self.entries.iter().filter(|e| e.category == category).collect();
      if entries.is_empty() {
        continue;
      }
      lines.push(format!("## {}", heading));
      lines.push(String::new());
      for entry in entries {
        lines.push(format!("- {}", entry.subject));
      }
      lines.push(String::new());
    }

    lines.push("## Detailed Changelog".to_string());
    lines.push(String::new());
    for entry in &self.entries {
      lines.push(format!("- {}: {}", entry.short_hash, entry.title));
    }

    lines.join("\n").trim().to_string()
  }
}

/// Builds changelogs from a repository's history
pub struct ChangelogBuilder<'a> {
  repo: &'a dyn GitRepository,
  classifier: Box<dyn CommitClassifier + 'a>,
  date: Option<NaiveDate>,
}

impl<'a> ChangelogBuilder<'a> {
  pub fn new(repo: &'a dyn GitRepository) -> Self {
    Self {
      repo,
      classifier: Box::new(ConventionalClassifier),
      date: None,
    }
  }

  pub fn with_classifier(mut self, classifier: impl CommitClassifier + 'a) -> Self {
    self.classifier = Box::new(classifier);
    self
  }

  /// Fix the release date (defaults to today, UTC)
  pub fn with_date(mut self, date: NaiveDate) -> Self {
    self.date = Some(date);
    self
  }

  /// Collect the commits in `start_ref..end_ref` touching `subpath`
  pub fn build(&self, subpath: &str, version: &str, start_ref: Option<&str>, end_ref: &str) -> DevResult<Changelog> {
    let subpath = normalize_subpath(subpath);
    let end = self.repo.resolve_ref(end_ref)?;
    let start = start_ref.map(|r| self.repo.resolve_ref(r)).transpose()?;

    let driver_name = driver_name(self.repo, &subpath, &end)?;

    let mut entries = Vec::new();
    for commit in self.repo.walk(&end, start.as_deref())? {
      if !self.touches(&commit, &subpath)? {
        continue;
      }
      let title = commit.summary().to_string();
      let (category, subject) = self.classifier.classify(&title);
      debug!(sha = %commit.short_sha, %category, "Including commit");
      entries.push(ChangelogEntry {
        category,
        subject,
        short_hash: commit.short_sha.clone(),
        title,
      });
    }

    Ok(Changelog {
      driver_name,
      version: version.to_string(),
      date: self.date.unwrap_or_else(|| Utc::now().date_naive()),
      entries,
    })
  }

  fn touches(&self, commit: &CommitInfo, subpath: &str) -> DevResult<bool> {
    if subpath == "." {
      return Ok(true);
    }
    let paths = match commit.parent_shas.first() {
      Some(parent) => self.repo.changed_paths(&commit.sha, parent)?,
      None => self.repo.tree_paths(&commit.sha)?,
    };
    Ok(paths.iter().any(|path| path_has_prefix(path, subpath)))
  }
}

fn normalize_subpath(subpath: &str) -> String {
  let trimmed = subpath.trim_start_matches("./").trim_end_matches('/');
  if trimmed.is_empty() {
    ".".to_string()
  } else {
    trimmed.to_string()
  }
}

/// `name` from `<subpath>/manifest.toml` as of `commit`
pub fn driver_name(repo: &dyn GitRepository, subpath: &str, commit: &str) -> DevResult<String> {
  let path = if subpath == "." {
    "manifest.toml".to_string()
  } else {
    format!("{}/manifest.toml", subpath)
  };

  let content = repo.read_file(commit, &path)?.ok_or_else(|| {
    DevError::with_help(
      format!("{} not found in tree of {}", path, commit),
      "The driver directory must contain a manifest.toml with a `name` field.",
    )
  })?;
  let text = String::from_utf8(content)?;
  let manifest: toml_edit::DocumentMut = text.parse()?;
  manifest
    .get("name")
    .and_then(|item| item.as_str())
    .map(str::to_string)
    .ok_or_else(|| DevError::message(format!("{} at {} has no `name` field", path, commit)))
}
