use crate::error::{Cause, Error};
use crate::token::{Token, TokenKind};
use std::collections::HashMap;

/// Maps named labels to their word address. Anonymous labels (`+`, `-`) are
/// never stored here; they are resolved positionally at encode time by
/// [`resolve_anchor`].
pub type LabelMap = HashMap<String, u16>;

/// Builds the label table from a token stream. A `Label` token binds its
/// name to the address of the token that follows it (labels do not
/// themselves consume an address). Anonymous anchors (`+`, `-`) are never
/// stored; rebinding one of those sigils is expected and not a duplicate.
/// Rebinding any other name is a fatal error.
pub fn build_label_table(tokens: &[Token]) -> Result<LabelMap, Error> {
    let mut map = LabelMap::new();
    for token in tokens {
        if let TokenKind::Label(name) = &token.kind {
            if name == "+" || name == "-" {
                continue;
            }
            if map.insert(name.clone(), token.address).is_some() {
                return Err(Error::new(token.line, name, Cause::DuplicateLabel));
            }
        }
    }
    Ok(map)
}

/// Resolves an anonymous label reference (`+` or `-`) at token index
/// `from_index` to the address of its nearest anchor.
///
/// `+` resolves to the next `+:` anchor at a strictly greater index; `-`
/// resolves to the previous `-:` anchor at a strictly lesser index. Unlike
/// the original implementation's backward scan (an unsigned loop counter
/// that underflows when no anchor exists), this performs a bounds-checked
/// search and reports a fatal [`Error`] when no anchor is found, matching
/// the documented "fatal error if no anchor" semantics.
pub fn resolve_anchor(tokens: &[Token], from_index: usize, sigil: &str) -> Result<u16, Error> {
    let reference = &tokens[from_index];

    if sigil == "+" {
        for token in tokens.iter().skip(from_index + 1) {
            if let TokenKind::Label(name) = &token.kind {
                if name == "+" {
                    return Ok(token.address);
                }
            }
        }
    } else {
        for token in tokens[..from_index].iter().rev() {
            if let TokenKind::Label(name) = &token.kind {
                if name == "-" {
                    return Ok(token.address);
                }
            }
        }
    }

    Err(Error::new(reference.line, sigil, Cause::MissingAnchor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;
    use matches::matches;

    #[test]
    fn named_label_binds_to_following_address() {
        let tokens = tokenize("jsr $sub\next a\nsub: mov a 42 ; ret").unwrap();
        let labels = build_label_table(&tokens).unwrap();
        assert_eq!(labels.get("sub"), Some(&2));
    }

    #[test]
    fn anonymous_labels_are_not_in_the_table() {
        let tokens = tokenize("mov a 0\n-: add a 1\njlt - a 3\next a").unwrap();
        let labels = build_label_table(&tokens).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn duplicate_named_label_is_fatal() {
        let tokens = tokenize("sub: nop\nsub: nop").unwrap();
        let err = build_label_table(&tokens).unwrap_err();
        assert_eq!(err.cause, Cause::DuplicateLabel);
    }

    #[test]
    fn backward_anchor_resolves_to_nearest_prior_anchor() {
        let tokens = tokenize("mov a 0\n-: add a 1\njlt - a 3\next a").unwrap();
        let jlt_minus_index = tokens
            .iter()
            .position(|t| matches!(&t.kind, crate::token::TokenKind::ImmediateLabelReference(s) if s == "-"))
            .unwrap();
        let resolved = resolve_anchor(&tokens, jlt_minus_index, "-").unwrap();
        let anchor_address = tokens
            .iter()
            .find(|t| matches!(&t.kind, crate::token::TokenKind::Label(s) if s == "-"))
            .unwrap()
            .address;
        assert_eq!(resolved, anchor_address);
    }

    #[test]
    fn missing_anchor_is_fatal() {
        let tokens = tokenize("jlt - a 3").unwrap();
        let err = resolve_anchor(&tokens, 1, "-").unwrap_err();
        assert_eq!(err.cause, Cause::MissingAnchor);
    }

    #[test]
    fn forward_anchor_resolves_to_next_anchor() {
        let tokens = tokenize("jlt + a 3\nadd a 1\n+: ext a").unwrap();
        let jlt_plus_index = tokens
            .iter()
            .position(|t| matches!(&t.kind, crate::token::TokenKind::ImmediateLabelReference(s) if s == "+"))
            .unwrap();
        let resolved = resolve_anchor(&tokens, jlt_plus_index, "+").unwrap();
        let anchor_address = tokens
            .iter()
            .find(|t| matches!(&t.kind, crate::token::TokenKind::Label(s) if s == "+"))
            .unwrap()
            .address;
        assert_eq!(resolved, anchor_address);
    }
}
