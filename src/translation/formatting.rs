/*!
 * Whitespace preservation for translated text.
 *
 * Translation services trim what they are given, so only the core of a text
 * is sent and cached. The leading and trailing whitespace of the original is
 * put back around the translated core.
 */

/// Original text split into padding and core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padded<'a> {
    pub leading: &'a str,
    pub core: &'a str,
    pub trailing: &'a str,
}

impl<'a> Padded<'a> {
    /// Split `text` around its trimmed core
    pub fn split(text: &'a str) -> Self {
        let core = text.trim();
        if core.is_empty() {
            return Self { leading: text, core, trailing: "" };
        }
        let start = text.len() - text.trim_start().len();
        let end = start + core.len();
        Self {
            leading: &text[..start],
            core,
            trailing: &text[end..],
        }
    }

    /// Wrap a translated core in the original padding
    pub fn rewrap(&self, translated_core: &str) -> String {
        let translated_core = translated_core.trim();
        let mut out = String::with_capacity(self.leading.len() + translated_core.len() + self.trailing.len());
        out.push_str(self.leading);
        out.push_str(translated_core);
        out.push_str(self.trailing);
        out
    }

    /// Whether the text carries no padding
    pub fn is_bare(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

/// Give `translated` the leading and trailing whitespace of `original`
pub fn preserve_whitespace(original: &str, translated: &str) -> String {
    Padded::split(original).rewrap(translated)
}
