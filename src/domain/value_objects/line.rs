use serde_json::Value;

/// Line value for an odds row.
///
/// `Main` is the canonical "no alternate line" marker. Upstream payloads
/// express it as JSON null, a missing field, an empty string, or the literal
/// string "null" depending on which feed revision produced them; all of those
/// normalize to `Main`. Every other value normalizes to one canonical string
/// so numeric and string forms of the same line share a single key
/// ("3.5", "3.50" and 3.5 are the same line).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Line {
    Main,
    At(String),
}

impl Line {
    /// Normalize a raw JSON line value from the upstream feed.
    pub fn normalize(raw: Option<&Value>) -> Line {
        match raw {
            None | Some(Value::Null) => Line::Main,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() => Line::At(canonical_number(v)),
                _ => Line::Main,
            },
            Some(Value::String(s)) => Line::from_text(s),
            Some(other) => Line::from_text(&other.to_string()),
        }
    }

    /// Normalize a line value already in string form (wager records, storage).
    pub fn from_text(s: &str) -> Line {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("undefined")
        {
            return Line::Main;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Line::At(canonical_number(v)),
            _ => Line::At(trimmed.to_string()),
        }
    }

    /// Storage form: the empty string stands in for `Main` so the store's
    /// UNIQUE index covers main lines (SQLite treats NULLs as distinct).
    pub fn as_storage(&self) -> &str {
        match self {
            Line::Main => "",
            Line::At(s) => s.as_str(),
        }
    }

    pub fn from_storage(s: &str) -> Line {
        if s.is_empty() {
            Line::Main
        } else {
            Line::from_text(s)
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, Line::Main)
    }

    /// Numeric threshold carried by this line, if any.
    pub fn threshold(&self) -> Option<f64> {
        match self {
            Line::Main => None,
            Line::At(s) => s.parse::<f64>().ok(),
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Line::Main => write!(f, "main"),
            Line::At(s) => write!(f, "{}", s),
        }
    }
}

fn canonical_number(v: f64) -> String {
    if v == 0.0 {
        // collapses -0.0
        "0".to_string()
    } else {
        format!("{}", v)
    }
}
