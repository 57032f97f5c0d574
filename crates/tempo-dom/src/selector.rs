//! Selector subset
//!
//! Parses the selector shapes player bindings actually use: tag, `#id`,
//! `.class`, `[attr]`, `[attr="value"]`, compounds of those, and the
//! descendant combinator.

/// Selector parsing error.
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unsupported selector syntax near {0:?}")]
    Unsupported(String),
}

/// A parsed selector: a descendant chain of compound parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub(crate) compounds: Vec<Compound>,
}

/// One compound part (everything between descendant combinators).
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrCheck>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttrCheck {
    pub(crate) name: String,
    pub(crate) value: Option<String>,
}

/// Parse a selector string.
pub fn parse_selector(input: &str) -> Result<Selector, SelectorError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SelectorError::Empty);
    }
    let mut compounds = Vec::new();
    for part in trimmed.split_whitespace() {
        compounds.push(parse_compound(part)?);
    }
    Ok(Selector { compounds })
}

fn parse_compound(part: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let chars: Vec<char> = part.chars().collect();
    let mut i = 0;

    // Leading tag name (or universal `*`).
    if i < chars.len() && chars[i] != '#' && chars[i] != '.' && chars[i] != '[' {
        let start = i;
        while i < chars.len() && chars[i] != '#' && chars[i] != '.' && chars[i] != '[' {
            i += 1;
        }
        let tag: String = chars[start..i].iter().collect();
        if tag != "*" {
            if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(SelectorError::Unsupported(part.to_string()));
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }
    }

    while i < chars.len() {
        match chars[i] {
            '#' | '.' => {
                let marker = chars[i];
                i += 1;
                let start = i;
                while i < chars.len() && chars[i] != '#' && chars[i] != '.' && chars[i] != '[' {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if name.is_empty() {
                    return Err(SelectorError::Unsupported(part.to_string()));
                }
                if marker == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
            }
            '[' => {
                i += 1;
                let start = i;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                if i == chars.len() {
                    return Err(SelectorError::Unsupported(part.to_string()));
                }
                let body: String = chars[start..i].iter().collect();
                i += 1; // skip ']'
                compound.attrs.push(parse_attr_check(&body, part)?);
            }
            _ => return Err(SelectorError::Unsupported(part.to_string())),
        }
    }

    if compound == Compound::default() {
        return Err(SelectorError::Unsupported(part.to_string()));
    }
    Ok(compound)
}

fn parse_attr_check(body: &str, whole: &str) -> Result<AttrCheck, SelectorError> {
    match body.split_once('=') {
        None => {
            if body.is_empty() {
                return Err(SelectorError::Unsupported(whole.to_string()));
            }
            Ok(AttrCheck {
                name: body.to_string(),
                value: None,
            })
        }
        Some((name, raw)) => {
            let value = raw.trim_matches(|c| c == '"' || c == '\'');
            Ok(AttrCheck {
                name: name.to_string(),
                value: Some(value.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound_selector() {
        let sel = parse_selector("video.html5-main-video").unwrap();
        assert_eq!(sel.compounds.len(), 1);
        assert_eq!(sel.compounds[0].tag.as_deref(), Some("video"));
        assert_eq!(sel.compounds[0].classes, vec!["html5-main-video"]);
    }

    #[test]
    fn test_parse_descendant_chain() {
        let sel = parse_selector("#movie_player video").unwrap();
        assert_eq!(sel.compounds.len(), 2);
        assert_eq!(sel.compounds[0].id.as_deref(), Some("movie_player"));
        assert_eq!(sel.compounds[1].tag.as_deref(), Some("video"));
    }

    #[test]
    fn test_parse_attr_selectors() {
        let sel = parse_selector("video[src]").unwrap();
        assert_eq!(sel.compounds[0].attrs[0].name, "src");
        assert_eq!(sel.compounds[0].attrs[0].value, None);

        let sel = parse_selector("div[role=\"toolbar\"]").unwrap();
        assert_eq!(sel.compounds[0].attrs[0].value.as_deref(), Some("toolbar"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_selector("").is_err());
        assert!(parse_selector("div[unclosed").is_err());
        assert!(parse_selector("a > b").is_err());
    }
}
