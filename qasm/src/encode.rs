use crate::error::{Cause, Error};
use crate::label::{resolve_anchor, LabelMap};
use crate::token::{Token, TokenKind};
use byteorder::ByteOrder;
use qcpu::AddressingMode;
use util::Endian;

fn mode_of(kind: &TokenKind) -> AddressingMode {
    match kind {
        TokenKind::Immediate(_) | TokenKind::ImmediateLabelReference(_) => {
            AddressingMode::Immediate
        }
        TokenKind::Absolute(_) | TokenKind::AbsoluteLabelReference(_) => AddressingMode::Absolute,
        TokenKind::Indirect(_) => AddressingMode::Indirect,
        TokenKind::Register(_) => AddressingMode::Register,
        // An Op or Label can never legally appear as an operand; default to
        // Immediate so a malformed program still produces *a* word rather
        // than panicking.
        TokenKind::Op(_) | TokenKind::Label(_) => AddressingMode::Immediate,
    }
}

fn pack_op_word(modes: &[AddressingMode], opcode: u16) -> u16 {
    let mut bits = 0u16;
    for (i, mode) in modes.iter().enumerate().take(4) {
        bits |= (*mode as u16) << (6 - i * 2);
    }
    (bits << 8) | opcode
}

fn lookup_label(name: &str, line: u32, labels: &LabelMap) -> Result<u16, Error> {
    labels
        .get(name)
        .copied()
        .ok_or_else(|| Error::new(line, name, Cause::UnresolvedLabel))
}

/// Encodes a token stream into the final word array, sized to
/// `max_address + 1`. Addresses left unassigned by `.org`/`.ds` gaps remain
/// zero.
pub fn convert(tokens: &[Token], labels: &LabelMap) -> Result<Vec<u16>, Error> {
    let max_address = tokens.iter().map(|t| t.address).max().unwrap_or(0);
    let mut words = vec![0u16; max_address as usize + 1];

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        match &token.kind {
            TokenKind::Label(_) => {}

            TokenKind::Op(spec) => {
                let arity = spec.arity as usize;
                let mut modes = [AddressingMode::Immediate; 4];
                if let Some(arg_tokens) = tokens.get(i + 1..i + 1 + arity) {
                    for (slot, arg) in arg_tokens.iter().enumerate() {
                        modes[slot] = mode_of(&arg.kind);
                    }
                }
                words[token.address as usize] = pack_op_word(&modes, spec.opcode as u16);
            }

            TokenKind::Register(id) => {
                words[token.address as usize] = *id as u16;
            }
            TokenKind::Immediate(value) => {
                words[token.address as usize] = *value;
            }
            TokenKind::Absolute(value) => {
                words[token.address as usize] = *value;
            }
            TokenKind::Indirect(id) => {
                words[token.address as usize] = *id as u16;
            }

            TokenKind::ImmediateLabelReference(name) => {
                let value = if name == "+" || name == "-" {
                    resolve_anchor(tokens, i, name)?
                } else {
                    lookup_label(name, token.line, labels)?
                };
                words[token.address as usize] = value;
            }
            TokenKind::AbsoluteLabelReference(name) => {
                let value = lookup_label(name, token.line, labels)?;
                words[token.address as usize] = value;
            }
        }
        i += 1;
    }

    Ok(words)
}

/// Serialises a word array to a little-endian byte image: word `n` occupies
/// bytes `2n` (low) and `2n+1` (high).
pub fn write(words: &[u16]) -> Vec<u8> {
    let mut bytes = vec![0u8; words.len() * 2];
    for (i, word) in words.iter().enumerate() {
        Endian::write_u16(&mut bytes[i * 2..i * 2 + 2], *word);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::build_label_table;
    use crate::token::tokenize;

    fn assemble(source: &str) -> Result<Vec<u8>, Error> {
        let tokens = tokenize(source)?;
        let labels = build_label_table(&tokens)?;
        let words = convert(&tokens, &labels)?;
        Ok(write(&words))
    }

    #[test]
    fn s1_encode_nop() {
        assert_eq!(assemble("nop").unwrap(), vec![0x00, 0x00]);
    }

    #[test]
    fn s2_encode_mov_a_5() {
        assert_eq!(
            assemble("mov a 5").unwrap(),
            vec![0x03, 0xC0, 0x00, 0x00, 0x05, 0x00]
        );
    }

    #[test]
    fn s4_subroutine_encodes_forward_label_reference() {
        let bytes = assemble("jsr $sub\next a\nsub: mov a 42 ; ret").unwrap();
        // word 0: jsr $sub -> jsr word (arity 1, absolute) = (0b01<<14)|0x0B = 0x400B
        assert_eq!(&bytes[0..2], &0x400Bu16.to_le_bytes());
        // word 1: resolved "sub" address (word 4)
        assert_eq!(&bytes[2..4], &4u16.to_le_bytes());
    }

    #[test]
    fn s6_anonymous_backward_label_resolves() {
        let bytes = assemble("mov a 0\n-: add a 1\njlt - a 3\next a").unwrap();
        // word 7 is the "-" reference operand of `jlt`; it resolves to word
        // 3, the address the `-:` anchor (re-)binds to `add`.
        assert_eq!(&bytes[14..16], &3u16.to_le_bytes());
    }

    #[test]
    fn unresolved_label_is_fatal() {
        let err = assemble("jsr $nowhere").unwrap_err();
        assert_eq!(err.cause, Cause::UnresolvedLabel);
    }

    #[test]
    fn little_endian_contract_holds_for_every_word() {
        let words = vec![0x1234u16, 0xABCDu16];
        let bytes = write(&words);
        assert_eq!(bytes, vec![0x34, 0x12, 0xCD, 0xAB]);
    }
}
