//! The initialization descriptor handed to `initialize`.
//!
//! The descriptor is the only channel through which the engine is
//! configured. It is either a filesystem path or an inline block of text;
//! both use the same syntax:
//!
//! - Fortran namelist style: `&group`, then `key = value` items separated
//!   by newlines or commas, closed by `/`. `!` starts a comment.
//! - Plain `key = value` lines. `#` starts a comment.
//!
//! Values are quoted strings, integers, reals (`1.5d3` accepted),
//! logicals (`.true.`, `false`, ...) or bare words. A line holding only
//! further comma-separated values extends the previous key into a list.
//! Keys are case-insensitive.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

// ── ConfigValue ────────────────────────────────────────────────────

/// A parsed configuration value.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    /// Quoted string or bare word.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Real literal.
    Real(f64),
    /// Logical literal.
    Bool(bool),
    /// Several values assigned to one key.
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Real(_) => "real",
            Self::Bool(_) => "logical",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Int(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{}", if *v { ".true." } else { ".false." }),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors raised while reading or querying a descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The descriptor string is empty or whitespace.
    Empty,
    /// The descriptor names a file that does not exist.
    NotFound {
        /// The missing path.
        path: PathBuf,
    },
    /// The descriptor file could not be read.
    Io {
        /// The unreadable path.
        path: PathBuf,
        /// OS error text.
        reason: String,
    },
    /// Malformed text.
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },
    /// A key appears twice.
    DuplicateKey {
        /// The repeated key.
        key: String,
    },
    /// The descriptor parsed but holds no entries.
    NoEntries,
    /// A required key is absent.
    MissingKey {
        /// The absent key.
        key: String,
    },
    /// A key holds a value of the wrong type or out of range.
    InvalidValue {
        /// The offending key.
        key: String,
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "configuration descriptor is empty"),
            Self::NotFound { path } => {
                write!(f, "configuration file not found: {}", path.display())
            }
            Self::Io { path, reason } => write!(f, "cannot read {}: {reason}", path.display()),
            Self::Syntax { line, reason } => write!(f, "line {line}: {reason}"),
            Self::DuplicateKey { key } => write!(f, "duplicate key '{key}'"),
            Self::NoEntries => write!(f, "configuration holds no entries"),
            Self::MissingKey { key } => write!(f, "missing required key '{key}'"),
            Self::InvalidValue { key, reason } => write!(f, "invalid value for '{key}': {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── InitConfig ─────────────────────────────────────────────────────

/// Where a descriptor came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file.
    File(PathBuf),
    /// Passed inline.
    Inline,
}

/// A parsed initialization descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct InitConfig {
    source: ConfigSource,
    group: Option<String>,
    entries: IndexMap<String, ConfigValue>,
}

impl InitConfig {
    /// Interpret `descriptor` as inline text if it contains `=` or a
    /// newline, otherwise as a path.
    pub fn from_descriptor(descriptor: &str) -> Result<Self, ConfigError> {
        let trimmed = descriptor.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Empty);
        }
        if trimmed.contains('=') || trimmed.contains('\n') {
            Self::parse(trimmed, ConfigSource::Inline)
        } else {
            Self::from_path(Path::new(trimmed))
        }
    }

    /// Read and parse a descriptor file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        })?;
        Self::parse(&text, ConfigSource::File(path.to_path_buf()))
    }

    /// Parse descriptor text.
    pub fn parse(text: &str, source: ConfigSource) -> Result<Self, ConfigError> {
        let mut parser = Parser::default();
        let mut last_line = 0;
        for (i, raw) in text.lines().enumerate() {
            last_line = i + 1;
            parser.line(last_line, raw)?;
        }
        if parser.group_state == GroupState::Open {
            return Err(ConfigError::Syntax {
                line: last_line,
                reason: "namelist group is not terminated by '/'".into(),
            });
        }
        if parser.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }
        Ok(Self {
            source,
            group: parser.group,
            entries: parser.entries,
        })
    }

    /// Where the descriptor came from.
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Namelist group name, lowercased, if the text used one.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the descriptor holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(&key.to_ascii_lowercase())
    }

    /// String value, if present.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(wrong_type(key, "string", other)),
        }
    }

    /// Numeric value, if present. Integers widen to `f64`.
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Real(v)) => Ok(Some(*v)),
            Some(ConfigValue::Int(v)) => Ok(Some(*v as f64)),
            Some(other) => Err(wrong_type(key, "number", other)),
        }
    }

    /// Integer value, if present.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(wrong_type(key, "integer", other)),
        }
    }

    /// Logical value, if present.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(wrong_type(key, "logical", other)),
        }
    }

    /// Required string value.
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.get_str(key)?.ok_or_else(|| missing(key))
    }

    /// Required numeric value.
    pub fn require_f64(&self, key: &str) -> Result<f64, ConfigError> {
        self.get_f64(key)?.ok_or_else(|| missing(key))
    }

    /// Required integer value.
    pub fn require_i64(&self, key: &str) -> Result<i64, ConfigError> {
        self.get_i64(key)?.ok_or_else(|| missing(key))
    }

    /// Directory of the descriptor file, if it came from one.
    pub fn base_dir(&self) -> Option<&Path> {
        match &self.source {
            ConfigSource::File(path) => path.parent(),
            ConfigSource::Inline => None,
        }
    }

    /// A string value as a path, relative paths resolved against
    /// [`base_dir`](Self::base_dir).
    pub fn resolve_path(&self, key: &str) -> Result<Option<PathBuf>, ConfigError> {
        let Some(raw) = self.get_str(key)? else {
            return Ok(None);
        };
        let path = Path::new(raw);
        match self.base_dir() {
            Some(base) if path.is_relative() => Ok(Some(base.join(path))),
            _ => Ok(Some(path.to_path_buf())),
        }
    }
}

fn wrong_type(key: &str, expected: &str, found: &ConfigValue) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("expected {expected}, found {} {found}", found.type_name()),
    }
}

fn missing(key: &str) -> ConfigError {
    ConfigError::MissingKey {
        key: key.to_string(),
    }
}

// ── parser ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum GroupState {
    #[default]
    None,
    Open,
    Closed,
}

#[derive(Default)]
struct Parser {
    group: Option<String>,
    group_state: GroupState,
    entries: IndexMap<String, ConfigValue>,
    last_key: Option<String>,
}

impl Parser {
    fn line(&mut self, line: usize, raw: &str) -> Result<(), ConfigError> {
        let syntax = |reason: &str| ConfigError::Syntax {
            line,
            reason: reason.to_string(),
        };
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            return Ok(());
        }
        if self.group_state == GroupState::Closed {
            return Err(syntax("content after namelist terminator"));
        }

        let mut rest = text;
        if let Some(after) = rest.strip_prefix('&') {
            if self.group_state != GroupState::None || !self.entries.is_empty() {
                return Err(syntax("unexpected namelist group"));
            }
            let name_end = after.find(char::is_whitespace).unwrap_or(after.len());
            let (name, tail) = after.split_at(name_end);
            if name.is_empty() {
                return Err(syntax("namelist group has no name"));
            }
            self.group = Some(name.to_ascii_lowercase());
            self.group_state = GroupState::Open;
            rest = tail.trim();
        }

        let namelist = self.group_state == GroupState::Open;
        let (segments, terminated) = split_segments(rest, namelist).map_err(|r| syntax(&r))?;
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match find_unquoted(segment, '=') {
                Some(eq) => {
                    let key = segment[..eq].trim().to_ascii_lowercase();
                    if !is_key(&key) {
                        return Err(syntax(&format!("invalid key '{key}'")));
                    }
                    let value_text = segment[eq + 1..].trim();
                    if value_text.is_empty() {
                        return Err(syntax(&format!("missing value for '{key}'")));
                    }
                    let value = parse_value(value_text).map_err(|r| syntax(&r))?;
                    if self.entries.contains_key(&key) {
                        return Err(ConfigError::DuplicateKey { key });
                    }
                    self.entries.insert(key.clone(), value);
                    self.last_key = Some(key);
                }
                None => {
                    let value = parse_value(segment).map_err(|r| syntax(&r))?;
                    let slot = self
                        .last_key
                        .as_ref()
                        .and_then(|k| self.entries.get_mut(k))
                        .ok_or_else(|| syntax("expected 'key = value'"))?;
                    match slot {
                        ConfigValue::List(items) => items.push(value),
                        other => {
                            let first = std::mem::replace(other, ConfigValue::List(Vec::new()));
                            *other = ConfigValue::List(vec![first, value]);
                        }
                    }
                }
            }
        }
        if terminated {
            self.group_state = GroupState::Closed;
        }
        Ok(())
    }
}

/// Drop a trailing `!` or `#` comment that is not inside quotes.
fn strip_comment(raw: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in raw.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '!' || c == '#' => return &raw[..i],
            None => {}
        }
    }
    raw
}

fn find_unquoted(text: &str, needle: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == needle => return Some(i),
            None => {}
        }
    }
    None
}

/// Split on unquoted commas. Inside a namelist an unquoted `/` ends the
/// group and must be the last thing on the line.
fn split_segments(text: &str, namelist: bool) -> Result<(Vec<&str>, bool), String> {
    let mut segments = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ',' => {
                segments.push(&text[start..i]);
                start = i + 1;
            }
            None if namelist && c == '/' => {
                if !text[i + 1..].trim().is_empty() {
                    return Err("content after namelist terminator".into());
                }
                segments.push(&text[start..i]);
                return Ok((segments, true));
            }
            None => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated string".into());
    }
    segments.push(&text[start..]);
    Ok((segments, false))
}

fn is_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '%')
}

fn parse_value(text: &str) -> Result<ConfigValue, String> {
    if let Some(q) = text.chars().next().filter(|c| *c == '\'' || *c == '"') {
        if text.len() < 2 || !text.ends_with(q) {
            return Err("unterminated string".into());
        }
        let inner = &text[1..text.len() - 1];
        let doubled: String = [q, q].iter().collect();
        return Ok(ConfigValue::Str(inner.replace(&doubled, &q.to_string())));
    }
    match text.to_ascii_lowercase().as_str() {
        ".true." | ".t." | "true" => return Ok(ConfigValue::Bool(true)),
        ".false." | ".f." | "false" => return Ok(ConfigValue::Bool(false)),
        _ => {}
    }
    if let Ok(v) = text.parse::<i64>() {
        return Ok(ConfigValue::Int(v));
    }
    let numeric = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E' | 'd' | 'D'));
    if numeric {
        let normalized = text.replace(&['d', 'D'][..], "e");
        if let Ok(v) = normalized.parse::<f64>() {
            return Ok(ConfigValue::Real(v));
        }
    }
    Ok(ConfigValue::Str(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fortran_namelist() {
        let text = "&bmi_wrf_hydro_config\n  wrfhydro_run_dir = \"/data/croton_NY/\"\n/\n";
        let cfg = InitConfig::parse(text, ConfigSource::Inline).unwrap();
        assert_eq!(cfg.group(), Some("bmi_wrf_hydro_config"));
        assert_eq!(
            cfg.get_str("wrfhydro_run_dir").unwrap(),
            Some("/data/croton_NY/")
        );
        assert_eq!(cfg.len(), 1);
    }

    #[test]
    fn namelist_items_on_one_line_with_comments() {
        let text = "&run nx = 4, ny = 3, dt = 3.6d3 ! seconds\n  verbose = .true. /";
        let cfg = InitConfig::parse(text, ConfigSource::Inline).unwrap();
        assert_eq!(cfg.get_i64("NX").unwrap(), Some(4));
        assert_eq!(cfg.get_i64("ny").unwrap(), Some(3));
        assert_eq!(cfg.get_f64("dt").unwrap(), Some(3600.0));
        assert_eq!(cfg.get_bool("verbose").unwrap(), Some(true));
        assert_eq!(cfg.keys().collect::<Vec<_>>(), vec!["nx", "ny", "dt", "verbose"]);
    }

    #[test]
    fn plain_key_value_lines() {
        let text = "# reference run\nrun_dir = /tmp/run/\nsteps = 6\nlayers = 0.1, 0.3\n  0.6\n";
        let cfg = InitConfig::parse(text, ConfigSource::Inline).unwrap();
        assert_eq!(cfg.group(), None);
        assert_eq!(cfg.get_str("run_dir").unwrap(), Some("/tmp/run/"));
        assert_eq!(
            cfg.get("layers"),
            Some(&ConfigValue::List(vec![
                ConfigValue::Real(0.1),
                ConfigValue::Real(0.3),
                ConfigValue::Real(0.6),
            ]))
        );
    }

    #[test]
    fn quoted_values_keep_separators() {
        let cfg = InitConfig::parse("title = 'a, b / c ! d'", ConfigSource::Inline).unwrap();
        assert_eq!(cfg.get_str("title").unwrap(), Some("a, b / c ! d"));
        let cfg = InitConfig::parse("title = 'it''s'", ConfigSource::Inline).unwrap();
        assert_eq!(cfg.get_str("title").unwrap(), Some("it's"));
    }

    #[test]
    fn duplicate_keys_rejected() {
        match InitConfig::parse("a = 1\nA = 2", ConfigSource::Inline) {
            Err(ConfigError::DuplicateKey { key }) => assert_eq!(key, "a"),
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_group_rejected() {
        match InitConfig::parse("&cfg\n a = 1\n", ConfigSource::Inline) {
            Err(ConfigError::Syntax { line: 2, .. }) => {}
            other => panic!("expected Syntax on line 2, got {other:?}"),
        }
    }

    #[test]
    fn content_after_terminator_rejected() {
        match InitConfig::parse("&cfg a = 1 /\nb = 2", ConfigSource::Inline) {
            Err(ConfigError::Syntax { line: 2, .. }) => {}
            other => panic!("expected Syntax on line 2, got {other:?}"),
        }
    }

    #[test]
    fn bare_value_without_key_rejected() {
        match InitConfig::parse("42", ConfigSource::Inline) {
            Err(ConfigError::Syntax { line: 1, .. }) => {}
            other => panic!("expected Syntax, got {other:?}"),
        }
    }

    #[test]
    fn comment_only_descriptor_has_no_entries() {
        assert_eq!(
            InitConfig::parse("! nothing here\n&cfg\n/\n", ConfigSource::Inline),
            Err(ConfigError::NoEntries)
        );
    }

    #[test]
    fn typed_accessors_report_wrong_types() {
        let cfg = InitConfig::parse("name = 'x'\nn = 3", ConfigSource::Inline).unwrap();
        match cfg.get_f64("name") {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "name"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
        assert_eq!(cfg.require_f64("n").unwrap(), 3.0);
        assert_eq!(
            cfg.require_str("missing"),
            Err(ConfigError::MissingKey {
                key: "missing".into()
            })
        );
    }

    #[test]
    fn descriptor_detection() {
        assert_eq!(InitConfig::from_descriptor("   "), Err(ConfigError::Empty));
        let inline = InitConfig::from_descriptor("nx = 2").unwrap();
        assert_eq!(inline.source(), &ConfigSource::Inline);
        match InitConfig::from_descriptor("/definitely/not/here.nml") {
            Err(ConfigError::NotFound { path }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.nml"))
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn file_descriptor_resolves_relative_paths() {
        let dir = std::env::temp_dir().join(format!("bmi-core-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("bmi_config.nml");
        std::fs::write(&file, "&cfg\n domain = 'DOMAIN'\n abs = '/abs/dir'\n/\n").unwrap();

        let cfg = InitConfig::from_descriptor(file.to_str().unwrap()).unwrap();
        assert_eq!(cfg.source(), &ConfigSource::File(file.clone()));
        assert_eq!(cfg.resolve_path("domain").unwrap(), Some(dir.join("DOMAIN")));
        assert_eq!(cfg.resolve_path("abs").unwrap(), Some(PathBuf::from("/abs/dir")));
        assert_eq!(cfg.resolve_path("nothing").unwrap(), None);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
