use serde::{Deserialize, Serialize};
use std::fmt;

/// File-name pattern restricting which files a rule stages.
///
/// Supports `*` (any run of characters) and `?` (one character). `*.*` keeps
/// its command-shell meaning and matches every file, with or without an
/// extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMask {
    pattern: String,
}

impl FileMask {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches_all(&self) -> bool {
        matches!(self.pattern.as_str(), "*" | "*.*" | "")
    }

    pub fn matches(&self, file_name: &str) -> bool {
        if self.matches_all() {
            return true;
        }
        let pattern: Vec<char> = self.pattern.chars().collect();
        let name: Vec<char> = file_name.chars().collect();
        wildcard_match(&pattern, &name)
    }
}

impl fmt::Display for FileMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

// Greedy matcher with single-star backtracking.
fn wildcard_match(p: &[char], t: &[char]) -> bool {
    let (mut pi, mut ti) = (0usize, 0usize);
    let (mut star_pi, mut star_ti) = (None::<usize>, 0usize);

    while ti < t.len() {
        if pi < p.len() && (p[pi] == t[ti] || p[pi] == '?') {
            pi += 1;
            ti += 1;
            continue;
        }

        if pi < p.len() && p[pi] == '*' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
            continue;
        }

        if let Some(sp) = star_pi {
            pi = sp + 1;
            star_ti += 1;
            ti = star_ti;
            continue;
        }

        return false;
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }

    pi == p.len()
}
