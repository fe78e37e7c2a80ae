/// Text-level preprocessing applied before tokenization.
pub trait SurfaceRewriter: Send + Sync {
    fn rewrite(&self, text: &str) -> String;
}

/// Leaves the text unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl SurfaceRewriter for Identity {
    fn rewrite(&self, text: &str) -> String {
        text.to_string()
    }
}

impl<F> SurfaceRewriter for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn rewrite(&self, text: &str) -> String {
        self(text)
    }
}

/// Ordered literal substitutions. A pattern edge that is an identifier
/// character only matches at a word boundary, so `now` leaves `known` alone.
#[derive(Clone, Debug, Default)]
pub struct SubstitutionTable {
    entries: Vec<(String, String)>,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit suffixes and legacy aliases of Solidity source.
    pub fn solidity() -> Self {
        Self::new()
            .with("now", "block.timestamp")
            .with(" ether", "e18")
            .with(" gwei", "e9")
            .with(" wei", "")
            .with(" seconds", "")
            .with(" minutes", " * 60")
            .with(" hours", " * 3600")
            .with(" days", " * 86400")
            .with(" weeks", " * 604800")
    }

    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.insert(from, to);
        self
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        if !from.is_empty() {
            self.entries.push((from, to.into()));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SurfaceRewriter for SubstitutionTable {
    fn rewrite(&self, text: &str) -> String {
        self.entries
            .iter()
            .fold(text.to_string(), |acc, (from, to)| replace_words(&acc, from, to))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn replace_words(text: &str, from: &str, to: &str) -> String {
    let guard_start = from.starts_with(is_word_char);
    let guard_end = from.ends_with(is_word_char);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (at, _) in text.match_indices(from) {
        let end = at + from.len();
        let before = text[..at].chars().next_back();
        let after = text[end..].chars().next();
        if (guard_start && before.is_some_and(|c| is_word_char(c) || c == '.'))
            || (guard_end && after.is_some_and(is_word_char))
        {
            continue;
        }
        out.push_str(&text[last..at]);
        out.push_str(to);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}
