//! Path and URL template interpolation
//!
//! Templates contain `:token` placeholders. Values are computed up front into a
//! [`TokenValues`] table and substituted in one left-to-right pass; substituted
//! text is never scanned again, so interpolation always terminates no matter what
//! the values contain. When several tokens match at the same position the longest
//! name wins (`:id_partition` before `:id`). Placeholders with no value are copied
//! through unchanged.

pub const TOKEN_DELIMITER: char = ':';

/// Token name to value table used for one interpolation.
#[derive(Debug, Clone, Default)]
pub struct TokenValues {
    values: Vec<(String, String)>,
}

impl TokenValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `token` (without the leading delimiter) to `value`, replacing any
    /// previous value. Empty token names are ignored.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let token = token.into();
        if token.is_empty() {
            return self;
        }
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == token) {
            Some(entry) => entry.1 = value,
            None => self.values.push((token, value)),
        }
        self
    }

    pub fn insert_opt<V: Into<String>>(
        &mut self,
        token: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.insert(token, value);
        }
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == token)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn interpolate(&self, template: &str) -> String {
        interpolate(template, self)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TokenValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = TokenValues::new();
        for (token, value) in iter {
            values.insert(token, value);
        }
        values
    }
}

pub fn interpolate(template: &str, values: &TokenValues) -> String {
    let mut tokens: Vec<&(String, String)> = values.values.iter().collect();
    tokens.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(TOKEN_DELIMITER) {
        output.push_str(&rest[..pos]);
        let after = &rest[pos + TOKEN_DELIMITER.len_utf8()..];

        match tokens.iter().find(|(name, _)| after.starts_with(name.as_str())) {
            Some((name, value)) => {
                output.push_str(value);
                rest = &after[name.len()..];
            }
            None => {
                output.push(TOKEN_DELIMITER);
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}

/// Zero-pad `id` to nine digits and split it into three-digit directories:
/// `1024` becomes `000/001/024`. Longer ids keep every digit, with the final
/// segment holding the remainder.
pub fn id_partition(id: u64) -> String {
    let padded = format!("{:09}", id);
    padded
        .as_bytes()
        .chunks(3)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// `BlogPost` -> `blog_post`, `Admin::User` -> `admin/user`.
pub fn underscore(name: &str) -> String {
    let mut output = String::with_capacity(name.len() + 4);
    let mut prev_lower_or_digit = false;

    for ch in name.replace("::", "/").chars() {
        if ch.is_uppercase() {
            if prev_lower_or_digit {
                output.push('_');
            }
            output.extend(ch.to_lowercase());
            prev_lower_or_digit = false;
        } else {
            output.push(if ch == '-' { '_' } else { ch });
            prev_lower_or_digit = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }

    output
}

/// Minimal English pluralisation for directory names.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    let ends_with_consonant_y = lower.ends_with('y')
        && !lower[..lower.len() - 1].ends_with(['a', 'e', 'i', 'o', 'u']);

    if ends_with_consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> TokenValues {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_id_partition() {
        assert_eq!(id_partition(1024), "000/001/024");
        assert_eq!(id_partition(1), "000/000/001");
        assert_eq!(id_partition(0), "000/000/000");
        assert_eq!(id_partition(123_456_789), "123/456/789");
        assert_eq!(id_partition(1_234_567_890), "123/456/789/0");
    }

    #[test]
    fn test_longest_token_wins() {
        let values = table(&[("a", "1"), ("ab", "2")]);
        assert_eq!(interpolate(":a.:ab", &values), "1.2");
    }

    #[test]
    fn test_id_and_partition_tokens() {
        let partition = id_partition(1024);
        let values = table(&[("id", "1024"), ("id_partition", partition.as_str())]);
        assert_eq!(
            interpolate(":id.omg/:id-bbq/:idwhat/:id_partition.wtf", &values),
            "1024.omg/1024-bbq/1024what/000/001/024.wtf"
        );
    }

    #[test]
    fn test_unresolved_tokens_pass_through() {
        let values = table(&[("style", "thumb")]);
        assert_eq!(
            interpolate("/:missing/:style/x:", &values),
            "/:missing/thumb/x:"
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let values = table(&[("filename", ":style"), ("style", "thumb")]);
        assert_eq!(interpolate(":filename/:style", &values), ":style/thumb");

        let values = table(&[("loop", ":loop")]);
        assert_eq!(interpolate(":loop:loop", &values), ":loop:loop");
    }

    #[test]
    fn test_insert_replaces_existing_value() {
        let mut values = TokenValues::new();
        values.insert("style", "a").insert("style", "b").insert("", "ignored");
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("style"), Some("b"));
    }

    #[test]
    fn test_insert_opt_skips_none() {
        let mut values = TokenValues::new();
        values.insert_opt("id", None::<String>);
        assert!(values.is_empty());
        assert_eq!(interpolate("/:id/", &values), "/:id/");
    }

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("Dummy"), "dummy");
        assert_eq!(underscore("BlogPost"), "blog_post");
        assert_eq!(underscore("Admin::UserProfile"), "admin/user_profile");
        assert_eq!(underscore("already_snake"), "already_snake");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("dummy"), "dummies");
        assert_eq!(pluralize("avatar"), "avatars");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize(""), "");
    }
}
