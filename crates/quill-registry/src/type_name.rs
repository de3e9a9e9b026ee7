//! Parsing and rendering of written type names.
//!
//! Type references reach the registry as strings such as
//! `Map<K, List<V>>[]`. Arguments are split on top-level commas only,
//! tracking angle-bracket depth, so nested generic arguments stay intact.

use std::fmt;

/// A structured type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    /// `Base` or `Base<Arg, ...>`
    Named { base: String, args: Vec<TypeName> },
    /// `Element[]`
    Array(Box<TypeName>),
}

impl TypeName {
    pub fn simple(base: impl Into<String>) -> Self {
        TypeName::Named {
            base: base.into(),
            args: Vec::new(),
        }
    }

    /// Parse a written type name. Returns `None` for malformed input
    /// (unbalanced brackets, empty arguments).
    pub fn parse(text: &str) -> Option<TypeName> {
        let text = text.trim();
        if let Some(inner) = text.strip_suffix("[]") {
            return Some(TypeName::Array(Box::new(TypeName::parse(inner)?)));
        }

        let Some(open) = text.find('<') else {
            if text.is_empty() || text.contains(['>', ',']) {
                return None;
            }
            return Some(TypeName::simple(text));
        };

        let base = text[..open].trim();
        let inner = text[open + 1..].strip_suffix('>')?;
        if base.is_empty() {
            return None;
        }
        let args = split_top_level(inner)?
            .into_iter()
            .map(TypeName::parse)
            .collect::<Option<Vec<_>>>()?;
        if args.is_empty() {
            return None;
        }
        Some(TypeName::Named {
            base: base.to_string(),
            args,
        })
    }
}

/// Split `text` on commas at angle-bracket depth zero.
///
/// Returns `None` if the brackets are unbalanced.
pub fn split_top_level(text: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    let last = text[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Named { base, args } => {
                f.write_str(base)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeName::Array(element) => write!(f, "{element}[]"),
        }
    }
}

/// Render a generic instance name from its base and argument names.
pub fn render_instance<S: AsRef<str>>(base: &str, args: &[S]) -> String {
    let joined: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    format!("{base}<{}>", joined.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_nesting() {
        assert_eq!(
            split_top_level("K, List<V>").unwrap(),
            vec!["K", "List<V>"]
        );
        assert_eq!(
            split_top_level("Map<A, B>, C").unwrap(),
            vec!["Map<A, B>", "C"]
        );
        assert!(split_top_level("A<B").is_none());
        assert!(split_top_level("A,,B").is_none());
    }

    #[test]
    fn parse_nested_generic() {
        let parsed = TypeName::parse("Map<K, List<V>>").unwrap();
        let TypeName::Named { base, args } = &parsed else {
            panic!("expected named");
        };
        assert_eq!(base, "Map");
        assert_eq!(args[1], TypeName::Named {
            base: "List".into(),
            args: vec![TypeName::simple("V")],
        });
        assert_eq!(parsed.to_string(), "Map<K, List<V>>");
    }

    #[test]
    fn parse_arrays() {
        assert_eq!(
            TypeName::parse("Int[][]").unwrap(),
            TypeName::Array(Box::new(TypeName::Array(Box::new(TypeName::simple("Int")))))
        );
        assert_eq!(TypeName::parse("Box<Int>[]").unwrap().to_string(), "Box<Int>[]");
    }

    #[test]
    fn rendering_normalizes_spacing() {
        assert_eq!(TypeName::parse("Pair<Int,Long>").unwrap().to_string(), "Pair<Int, Long>");
        assert_eq!(render_instance("Pair", &["Int", "Long"]), "Pair<Int, Long>");
    }

    #[test]
    fn malformed_names() {
        assert!(TypeName::parse("").is_none());
        assert!(TypeName::parse("Box<>").is_none());
        assert!(TypeName::parse("Box<Int").is_none());
        assert!(TypeName::parse("<Int>").is_none());
    }
}
