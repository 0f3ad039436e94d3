//! Placeholder substitution for `${name}` style values.

use crate::error::{ContextError, Result};
use std::collections::HashSet;

/// Suffix to simple-prefix pairs used to track nested placeholders.
const WELL_KNOWN_SIMPLE_PREFIXES: [(&str, &str); 3] = [("}", "{"), ("]", "["), (")", "(")];

/// Replaces placeholders in strings using a caller-supplied resolver.
///
/// Placeholders may nest (`${a${b}}`), carry a default after the value
/// separator (`${port:8080}`), and resolve to values that themselves contain
/// placeholders. A placeholder that refers back to itself is an error.
///
/// # Example
///
/// ```
/// use meshestra_context::config::PlaceholderHelper;
///
/// let helper = PlaceholderHelper::new("${", "}", Some(":"), false);
/// let value = helper
///     .replace_placeholders("jdbc://${host}:${port:5432}", |name| {
///         (name == "host").then(|| "db.local".to_string())
///     })
///     .unwrap();
/// assert_eq!(value, "jdbc://db.local:5432");
/// ```
#[derive(Debug, Clone)]
pub struct PlaceholderHelper {
    prefix: String,
    suffix: String,
    simple_prefix: String,
    value_separator: Option<String>,
    ignore_unresolvable: bool,
}

impl PlaceholderHelper {
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        value_separator: Option<&str>,
        ignore_unresolvable: bool,
    ) -> Self {
        let prefix = prefix.into();
        let suffix = suffix.into();
        let simple_prefix = WELL_KNOWN_SIMPLE_PREFIXES
            .iter()
            .find(|(s, p)| *s == suffix && prefix.ends_with(p))
            .map(|(_, p)| (*p).to_string())
            .unwrap_or_else(|| prefix.clone());
        Self {
            prefix,
            suffix,
            simple_prefix,
            value_separator: value_separator.map(str::to_string),
            ignore_unresolvable,
        }
    }

    pub fn ignores_unresolvable(&self) -> bool {
        self.ignore_unresolvable
    }

    /// Replace every placeholder in `value` with the resolver's answer.
    pub fn replace_placeholders<F>(&self, value: &str, resolver: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut visited = HashSet::new();
        self.parse(value, &resolver, &mut visited)
    }

    fn parse(
        &self,
        value: &str,
        resolver: &dyn Fn(&str) -> Option<String>,
        visited: &mut HashSet<String>,
    ) -> Result<String> {
        let Some(mut start) = value.find(&self.prefix) else {
            return Ok(value.to_string());
        };

        let mut result = value.to_string();
        loop {
            let Some(end) = self.find_placeholder_end(&result, start) else {
                break;
            };
            let original = result[start + self.prefix.len()..end].to_string();
            if !visited.insert(original.clone()) {
                return Err(ContextError::CircularPlaceholder {
                    placeholder: original,
                });
            }

            // Nested placeholders inside the key resolve first.
            let placeholder = self.parse(&original, resolver, visited)?;
            let mut resolved = resolver(&placeholder);
            if resolved.is_none() {
                if let Some(separator) = &self.value_separator {
                    if let Some(index) = placeholder.find(separator.as_str()) {
                        let actual = &placeholder[..index];
                        let default = &placeholder[index + separator.len()..];
                        resolved = Some(resolver(actual).unwrap_or_else(|| default.to_string()));
                    }
                }
            }

            let next = match resolved {
                Some(raw) => {
                    let replacement = self.parse(&raw, resolver, visited)?;
                    result.replace_range(start..end + self.suffix.len(), &replacement);
                    tracing::trace!(placeholder = %placeholder, "Resolved placeholder");
                    find_from(&result, &self.prefix, start + replacement.len())
                }
                None if self.ignore_unresolvable => {
                    find_from(&result, &self.prefix, end + self.suffix.len())
                }
                None => {
                    return Err(ContextError::UnresolvablePlaceholder {
                        placeholder,
                        value: value.to_string(),
                    });
                }
            };
            visited.remove(&original);

            match next {
                Some(index) => start = index,
                None => break,
            }
        }
        Ok(result)
    }

    fn find_placeholder_end(&self, buf: &str, start: usize) -> Option<usize> {
        let mut index = start + self.prefix.len();
        let mut nested = 0usize;
        while index < buf.len() {
            let rest = &buf[index..];
            if rest.starts_with(&self.suffix) {
                if nested == 0 {
                    return Some(index);
                }
                nested -= 1;
                index += self.suffix.len();
            } else if rest.starts_with(&self.simple_prefix) {
                nested += 1;
                index += self.simple_prefix.len();
            } else {
                index += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
        None
    }
}

impl Default for PlaceholderHelper {
    fn default() -> Self {
        Self::new("${", "}", Some(":"), false)
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack
        .get(from..)
        .and_then(|tail| tail.find(needle))
        .map(|index| index + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_replacement() {
        let p = props(&[("user", "echo")]);
        let helper = PlaceholderHelper::default();
        let out = helper
            .replace_placeholders("/ioc/core01/${user}.xml", |k| p.get(k).cloned())
            .unwrap();
        assert_eq!(out, "/ioc/core01/echo.xml");
    }

    #[test]
    fn test_nested_key_and_recursive_value() {
        let p = props(&[("env", "prod"), ("url.prod", "${host}/db"), ("host", "h1")]);
        let helper = PlaceholderHelper::default();
        let out = helper
            .replace_placeholders("${url.${env}}", |k| p.get(k).cloned())
            .unwrap();
        assert_eq!(out, "h1/db");
    }

    #[test]
    fn test_default_value_after_separator() {
        let helper = PlaceholderHelper::default();
        let out = helper
            .replace_placeholders("port=${port:8080}", |_| None)
            .unwrap();
        assert_eq!(out, "port=8080");
    }

    #[test]
    fn test_circular_reference_is_rejected() {
        let p = props(&[("a", "${b}"), ("b", "${a}")]);
        let helper = PlaceholderHelper::default();
        let err = helper
            .replace_placeholders("${a}", |k| p.get(k).cloned())
            .unwrap_err();
        assert!(matches!(err, ContextError::CircularPlaceholder { .. }));
    }

    #[test]
    fn test_unresolvable_strict_and_lenient() {
        let strict = PlaceholderHelper::new("${", "}", None, false);
        assert!(matches!(
            strict.replace_placeholders("x ${missing} y", |_| None),
            Err(ContextError::UnresolvablePlaceholder { .. })
        ));

        let lenient = PlaceholderHelper::new("${", "}", None, true);
        let out = lenient
            .replace_placeholders("x ${missing} ${name}", |k| {
                (k == "name").then(|| "n".to_string())
            })
            .unwrap();
        assert_eq!(out, "x ${missing} n");
    }

    #[test]
    fn test_same_placeholder_twice_is_not_circular() {
        let p = props(&[("a", "1")]);
        let helper = PlaceholderHelper::default();
        let out = helper
            .replace_placeholders("${a}-${a}", |k| p.get(k).cloned())
            .unwrap();
        assert_eq!(out, "1-1");
    }

    #[test]
    fn test_non_ascii_text_around_placeholders() {
        let p = props(&[("name", "값")]);
        let helper = PlaceholderHelper::default();
        let out = helper
            .replace_placeholders("이름: ${name} 끝", |k| p.get(k).cloned())
            .unwrap();
        assert_eq!(out, "이름: 값 끝");
    }
}
