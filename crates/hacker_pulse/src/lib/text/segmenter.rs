/// A sentence (or sentence-like fragment) of a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptUnit {
    /// Position of the unit in the transcript, starting at 0
    pub index: usize,
    pub text: String,
}

impl TranscriptUnit {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Lazy sentence iterator over a transcript.
///
/// Cloning the iterator restarts from the clone point, so the same text can be
/// walked as many times as needed without re-allocating it.
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    text: &'a str,
    cursor: usize,
    next_index: usize,
}

/// Splits `text` into sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or the end of the
/// text. Runs of terminators (`?!`, `...`) and closing quotes or brackets right
/// after them stay with the sentence they close. Text without any terminator
/// comes back as a single unit; blank text yields nothing.
pub fn segment(text: &str) -> Sentences<'_> {
    Sentences {
        text,
        cursor: 0,
        next_index: 0,
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | '\u{201D}' | '\u{2019}' | ')' | ']')
}

impl Sentences<'_> {
    /// Byte offset (relative to `rest`) just past the end of the first sentence
    fn sentence_end(rest: &str) -> usize {
        let mut chars = rest.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if !is_terminator(c) {
                continue;
            }

            while chars.next_if(|&(_, c)| is_terminator(c)).is_some() {}
            while chars.next_if(|&(_, c)| is_closer(c)).is_some() {}

            match chars.peek() {
                None => return rest.len(),
                Some(&(offset, next)) if next.is_whitespace() => return offset,
                // "3.14", "example.com": not a boundary
                Some(_) => {}
            }
        }

        rest.len()
    }
}

impl Iterator for Sentences<'_> {
    type Item = TranscriptUnit;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.cursor..];
        let start = rest.len() - rest.trim_start().len();
        let rest = &rest[start..];

        if rest.is_empty() {
            self.cursor = self.text.len();
            return None;
        }

        let end = Self::sentence_end(rest);
        let unit = TranscriptUnit {
            index: self.next_index,
            text: rest[..end].trim_end().to_string(),
        };

        self.cursor += start + end;
        self.next_index += 1;

        Some(unit)
    }
}

impl std::iter::FusedIterator for Sentences<'_> {}
