//! IFS-aware word splitting (spec §4.7).

use crate::quoting::{ESC, NS};
use crate::worddesc::{WordDesc, WordFlags};

const DEFAULT_IFS: &str = " \t\n";

/// Classification of an IFS's characters, computed once per splitting call
/// (spec §3: "its first character, presence, and 'null' status are computed
/// once").
#[derive(Debug, Clone)]
pub struct IfsInfo {
    /// Whether IFS was unset (as opposed to set-but-empty).
    pub unset: bool,
    /// The raw IFS value, or the Bourne default if unset.
    pub value: String,
    /// First character of the (effective) IFS value, if any.
    pub first_char: Option<char>,
}

impl IfsInfo {
    /// Builds IFS classification from an optional lookup result (`None`
    /// means unset).
    #[must_use]
    pub fn new(ifs: Option<&str>) -> Self {
        match ifs {
            None => Self {
                unset: true,
                value: DEFAULT_IFS.to_string(),
                first_char: Some(' '),
            },
            Some(v) => Self {
                unset: false,
                first_char: v.chars().next(),
                value: v.to_string(),
            },
        }
    }

    /// Whether splitting should happen at all (empty-but-set IFS disables
    /// it entirely).
    #[must_use]
    pub fn splits(&self) -> bool {
        self.unset || !self.value.is_empty()
    }

    /// Whether IFS is exactly the Bourne default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.unset || self.value == DEFAULT_IFS
    }

    fn is_ifs_whitespace(&self, c: char) -> bool {
        matches!(c, ' ' | '\t' | '\n') && self.value.contains(c)
    }
}

/// Splits `bytes` (the already-expanded content of one word, still carrying
/// `ESC`/`NS` control bytes) into fields according to `ifs`, and returns the
/// resulting [`WordDesc`]s. `had_quoted_null` indicates the unsplit content
/// was exactly the quoted-null sentinel.
#[must_use]
pub fn split(bytes: &[u8], ifs: &IfsInfo, had_quoted_null: bool) -> Vec<WordDesc> {
    if !ifs.splits() {
        return vec![WordDesc::new(bytes.to_vec())];
    }

    if bytes == [NS] {
        return if had_quoted_null {
            vec![WordDesc::with_flags(
                Vec::new(),
                WordFlags::HAS_QUOTED_NULL,
            )]
        } else {
            vec![]
        };
    }

    if ifs.is_default() {
        split_default(bytes)
    } else {
        split_custom(bytes, ifs)
    }
}

fn split_default(bytes: &[u8]) -> Vec<WordDesc> {
    let mut fields = Vec::new();
    let mut current = Vec::new();
    let mut i = 0;
    let mut in_field = false;

    while i < bytes.len() {
        let b = bytes[i];
        if b == ESC {
            current.push(b);
            if i + 1 < bytes.len() {
                current.push(bytes[i + 1]);
            }
            i += 2;
            in_field = true;
            continue;
        }
        let is_ws = matches!(b, b' ' | b'\t' | b'\n');
        if is_ws {
            if in_field {
                fields.push(WordDesc::new(std::mem::take(&mut current)));
                in_field = false;
            }
            i += 1;
        } else {
            current.push(b);
            in_field = true;
            i += 1;
        }
    }
    if in_field {
        fields.push(WordDesc::new(current));
    }
    fields
}

fn split_custom(bytes: &[u8], ifs: &IfsInfo) -> Vec<WordDesc> {
    let mut fields = Vec::new();
    let mut current = Vec::new();
    let mut i = 0;
    let mut have_content = false;
    // Whether we've started a field with at least a non-whitespace delimiter
    // seen, so that a lone whitespace-delimiter run at the edges doesn't
    // fabricate an empty field.
    let mut pending_field = false;

    while i < bytes.len() {
        let b = bytes[i];
        if b == ESC {
            current.push(b);
            if i + 1 < bytes.len() {
                current.push(bytes[i + 1]);
            }
            i += 2;
            have_content = true;
            pending_field = true;
            continue;
        }

        let c = b as char;
        if c.is_ascii() && ifs.value.contains(c) {
            if ifs.is_ifs_whitespace(c) {
                // IFS-whitespace: coalesces with adjacent IFS-whitespace;
                // only closes a field if one is open.
                if pending_field {
                    fields.push(WordDesc::new(std::mem::take(&mut current)));
                    pending_field = false;
                    have_content = false;
                }
                i += 1;
                // Skip a run of further IFS-whitespace.
                while i < bytes.len()
                    && bytes[i] != ESC
                    && ifs.is_ifs_whitespace(bytes[i] as char)
                {
                    i += 1;
                }
            } else {
                // IFS non-whitespace: always delimits a field, even if the
                // preceding/following content is empty (spec scenario #13).
                fields.push(WordDesc::new(std::mem::take(&mut current)));
                have_content = false;
                pending_field = false;
                i += 1;
                // Absorb immediately-following IFS-whitespace as part of the
                // same separator.
                while i < bytes.len()
                    && bytes[i] != ESC
                    && ifs.is_ifs_whitespace(bytes[i] as char)
                {
                    i += 1;
                }
            }
            continue;
        }

        current.push(b);
        have_content = true;
        pending_field = true;
        i += 1;
    }

    if have_content || pending_field {
        fields.push(WordDesc::new(current));
    }

    fields
}

/// Joins field strings with the first character of IFS (spec §4.3 `"$*"`
/// semantics): space if IFS unset, nothing if IFS is the empty string.
#[must_use]
pub fn join_with_ifs_first_char(fields: &[String], ifs: &IfsInfo) -> String {
    let sep = if ifs.unset {
        " ".to_string()
    } else {
        ifs.first_char.map_or_else(String::new, |c| c.to_string())
    };
    fields.join(&sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_strings(words: &[WordDesc]) -> Vec<String> {
        words.iter().map(|w| w.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn default_ifs_collapses_whitespace_and_trims() {
        let ifs = IfsInfo::new(None);
        let out = split(b"  a  b  ", &ifs, false);
        assert_eq!(field_strings(&out), vec!["a", "b"]);
    }

    #[test]
    fn default_ifs_never_yields_empty_fields() {
        let ifs = IfsInfo::new(Some(" \t\n"));
        let out = split(b"a   b", &ifs, false);
        assert_eq!(field_strings(&out), vec!["a", "b"]);
    }

    #[test]
    fn custom_ifs_nonwhitespace_preserves_empty_field() {
        let ifs = IfsInfo::new(Some(":"));
        let out = split(b"a::b", &ifs, false);
        assert_eq!(field_strings(&out), vec!["a", "", "b"]);
    }

    #[test]
    fn custom_ifs_whitespace_like_colon_with_space() {
        let ifs = IfsInfo::new(Some(": "));
        let out = split(b"a: b : c", &ifs, false);
        // ':' is IFS non-whitespace -> always a field break;
        // ' ' is IFS-whitespace -> coalesces with adjacent separators.
        assert_eq!(field_strings(&out), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_ifs_does_not_split() {
        let ifs = IfsInfo::new(Some(""));
        let out = split(b"a b c", &ifs, false);
        assert_eq!(field_strings(&out), vec!["a b c"]);
    }

    #[test]
    fn escaped_separators_are_not_split_points() {
        let ifs = IfsInfo::new(None);
        let out = split(&[b'a', ESC, b' ', b'b'], &ifs, false);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn sole_quoted_null_becomes_empty_arg() {
        let ifs = IfsInfo::new(None);
        let out = split(&[NS], &ifs, true);
        assert_eq!(out.len(), 1);
        assert!(out[0].bytes.is_empty());
        assert!(out[0].flags.contains(WordFlags::HAS_QUOTED_NULL));
    }
}
