//! Assignment separator (spec §4.9): splits a `WordList` into a leading
//! run of `NAME=value` words and the remainder.

use crate::worddesc::{WordFlags, WordList};

/// The result of separating assignment words from the rest of a command
/// line's word list.
#[derive(Debug, Clone, Default)]
pub struct Separated {
    /// Leading `NAME=value` words, in order, to be applied to either the
    /// command's temporary environment or the shell's permanent one.
    pub assignments: WordList,
    /// Everything else (the command name and its arguments).
    pub remainder: WordList,
}

/// Pulls the leading run of `ASSIGNMENT`-flagged words out of `words`. If
/// `keywords_in_env` is set, continues to harvest assignment words from the
/// rest of the list too (e.g. `time VAR=1 cmd` style constructs), rather
/// than stopping at the first non-assignment word.
#[must_use]
pub fn separate(words: WordList, keywords_in_env: bool) -> Separated {
    let mut assignments = WordList::new();
    let mut remainder = WordList::new();
    let mut in_leading_run = true;

    for word in words {
        let is_assignment = word.flags.contains(WordFlags::ASSIGNMENT);
        if is_assignment && (in_leading_run || keywords_in_env) {
            assignments.push(word);
        } else {
            in_leading_run = false;
            remainder.push(word);
        }
    }

    Separated {
        assignments,
        remainder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worddesc::WordDesc;

    fn assign(s: &str) -> WordDesc {
        WordDesc::with_flags(s, WordFlags::ASSIGNMENT)
    }

    fn plain(s: &str) -> WordDesc {
        WordDesc::new(s)
    }

    #[test]
    fn leading_assignments_are_separated() {
        let mut words = WordList::new();
        words.push(assign("A=1"));
        words.push(assign("B=2"));
        words.push(plain("cmd"));
        words.push(plain("arg"));

        let result = separate(words, false);
        assert_eq!(result.assignments.len(), 2);
        assert_eq!(result.remainder.len(), 2);
    }

    #[test]
    fn stops_at_first_non_assignment_by_default() {
        let mut words = WordList::new();
        words.push(assign("A=1"));
        words.push(plain("cmd"));
        words.push(assign("B=2"));

        let result = separate(words, false);
        assert_eq!(result.assignments.len(), 1);
        assert_eq!(result.remainder.len(), 2);
    }

    #[test]
    fn keywords_in_env_harvests_throughout() {
        let mut words = WordList::new();
        words.push(assign("A=1"));
        words.push(plain("cmd"));
        words.push(assign("B=2"));

        let result = separate(words, true);
        assert_eq!(result.assignments.len(), 2);
        assert_eq!(result.remainder.len(), 1);
    }

    #[test]
    fn no_assignments_yields_empty_queue() {
        let mut words = WordList::new();
        words.push(plain("cmd"));
        words.push(plain("arg"));
        let result = separate(words, false);
        assert!(result.assignments.is_empty());
        assert_eq!(result.remainder.len(), 2);
    }
}
