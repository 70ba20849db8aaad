//! Quoting codec: encode/decode the internal sentinel bytes that carry
//! quoting metadata through the intermediate expansion buffer (spec §4.1).
//!
//! Two control bytes never appear "bare" in a well-formed intermediate
//! stream (spec §3 invariant 1): every literal occurrence of [`ESC`] or
//! [`NS`] in user data is itself preceded by an [`ESC`] byte.

/// Escape byte: the following byte is literal, regardless of its value.
pub const ESC: u8 = 0x01;
/// Quoted-null sentinel: represents a literal quoted empty string.
pub const NS: u8 = 0x7F;

/// Splits `bytes` into `(char_bytes, rest)` honoring UTF-8 when `multibyte`
/// is true; otherwise takes exactly one byte.
fn next_char(bytes: &[u8], multibyte: bool) -> (&[u8], &[u8]) {
    if !multibyte || bytes.is_empty() {
        return bytes.split_at(bytes.len().min(1));
    }
    let width = utf8_len(bytes[0]).min(bytes.len());
    bytes.split_at(width)
}

const fn utf8_len(first_byte: u8) -> usize {
    if first_byte & 0b1000_0000 == 0 {
        1
    } else if first_byte & 0b1110_0000 == 0b1100_0000 {
        2
    } else if first_byte & 0b1111_0000 == 0b1110_0000 {
        3
    } else if first_byte & 0b1111_1000 == 0b1111_0000 {
        4
    } else {
        1
    }
}

/// Prepends [`ESC`] before every [`ESC`], [`NS`], and -- when `ifs_is_empty`
/// is true -- every ASCII space, so later splitting stages see them as
/// literal content rather than structural bytes.
#[must_use]
pub fn quote_escapes(bytes: &[u8], ifs_is_empty: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if b == ESC || b == NS || (ifs_is_empty && b == b' ') {
            out.push(ESC);
        }
        out.push(b);
    }
    out
}

/// Prepends [`ESC`] before every whole character of `bytes` (multibyte-aware:
/// one `ESC` per code point, never splitting it). An empty input returns the
/// quoted-null sentinel [`NS`] on its own, per spec §4.1.
#[must_use]
pub fn quote_string(bytes: &[u8], multibyte: bool) -> Vec<u8> {
    if bytes.is_empty() {
        return vec![NS];
    }

    let mut out = Vec::with_capacity(bytes.len() * 2);
    let mut rest = bytes;
    while !rest.is_empty() {
        let (ch, tail) = next_char(rest, multibyte);
        out.push(ESC);
        out.extend_from_slice(ch);
        rest = tail;
    }
    out
}

/// Inverse of [`quote_string`]: a bare [`NS`] decodes to empty; a trailing
/// [`ESC`] with nothing following it is dropped.
#[must_use]
pub fn dequote_string(bytes: &[u8]) -> Vec<u8> {
    if bytes == [NS] {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(bytes.len());
    let mut it = bytes.iter().copied().peekable();
    while let Some(b) = it.next() {
        if b == ESC {
            if let Some(next) = it.next() {
                out.push(next);
            }
            // trailing lone ESC: dropped
        } else if b != NS {
            out.push(b);
        }
    }
    out
}

/// Inverse of [`quote_escapes`]: removes the [`ESC`] that shields an
/// [`ESC`]/[`NS`]/IFS-space byte, leaving the shielded byte in place.
#[must_use]
pub fn dequote_escapes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut it = bytes.iter().copied().peekable();
    while let Some(b) = it.next() {
        if b == ESC {
            if let Some(next) = it.next() {
                out.push(next);
            }
        } else {
            out.push(b);
        }
    }
    out
}

/// Like [`quote_string`] but without the empty-input-becomes-[`NS`] special
/// case: an empty input yields an empty output. Used to shield a literal
/// quoted chunk that is only *part* of a larger word, where an embedded
/// empty quote construct should contribute nothing rather than becoming a
/// stray sentinel.
#[must_use]
pub fn shield_literal(bytes: &[u8], multibyte: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    let mut rest = bytes;
    while !rest.is_empty() {
        let (ch, tail) = next_char(rest, multibyte);
        out.push(ESC);
        out.extend_from_slice(ch);
        rest = tail;
    }
    out
}

/// Deletes [`NS`] bytes that are not the sole content of `bytes` (spec
/// §3 invariant 2/3: a final `WordList` carries no stray `NS`).
#[must_use]
pub fn remove_quoted_nulls(bytes: &[u8]) -> Vec<u8> {
    if bytes == [NS] {
        return bytes.to_vec();
    }
    bytes.iter().copied().filter(|&b| b != NS).collect()
}

/// Deletes the [`ESC`] preceding an IFS character, used when the caller has
/// determined that splitting will not happen and the shielding is no longer
/// needed.
#[must_use]
pub fn remove_quoted_ifs(bytes: &[u8], ifs_chars: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut it = bytes.iter().copied().peekable();
    while let Some(b) = it.next() {
        if b == ESC {
            if let Some(&next) = it.peek() {
                if ifs_chars.as_bytes().contains(&next) {
                    it.next();
                    out.push(next);
                    continue;
                }
            }
            out.push(b);
        } else {
            out.push(b);
        }
    }
    out
}

/// Final quote removal: strip every `ESC`/`NS` control byte from a word
/// that is about to leave the pipeline (spec §3 invariant 3), except that a
/// word whose entire content is `NS` alone collapses to the empty string
/// (its "quoted null"-ness is carried via `WordFlags::HAS_QUOTED_NULL`
/// instead, by the caller).
#[must_use]
pub fn quote_removal(bytes: &[u8]) -> Vec<u8> {
    if bytes == [NS] {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut it = bytes.iter().copied().peekable();
    while let Some(b) = it.next() {
        match b {
            ESC => {
                if let Some(next) = it.next() {
                    out.push(next);
                }
            }
            NS => {}
            _ => out.push(b),
        }
    }
    out
}
