//! The instruction set: opcodes, addressing modes, and the register file
//! index. The opcode/arity table mirrors `Assembler::OPS` in the original
//! source (`qcpu-c/source/Assembler.cpp`) exactly, including values and
//! arities.

use num_derive::{FromPrimitive, ToPrimitive};
use util_derive::EnumFromStr;

/// How an operand word is interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
pub enum AddressingMode {
    Immediate = 0b00,
    Absolute = 0b01,
    Indirect = 0b10,
    Register = 0b11,
}

/// Index into the six-register file. Variant identifiers are the literal,
/// lowercase register letters, so `EnumFromStr` doubles as the
/// case-sensitive-lowercase-only register-name matcher the assembler
/// tokenizer requires.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive, EnumFromStr)]
#[allow(non_camel_case_types)]
pub enum RegisterId {
    a = 0,
    b = 1,
    c = 2,
    d = 3,
    x = 4,
    y = 5,
}

/// The 25 opcodes. Discriminants are the assembled byte values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, ToPrimitive)]
pub enum Opcode {
    Nop = 0x00,
    Ext = 0x01,
    Sys = 0x02,
    Mov = 0x03,
    Jmp = 0x04,
    Jeq = 0x05,
    Jne = 0x06,
    Jgt = 0x07,
    Jge = 0x08,
    Jlt = 0x09,
    Jle = 0x0A,
    Jsr = 0x0B,
    Ret = 0x0C,
    Add = 0x0D,
    Sub = 0x0E,
    Mul = 0x0F,
    Mdl = 0x10,
    And = 0x11,
    Orr = 0x12,
    Not = 0x13,
    Xor = 0x14,
    Lsl = 0x15,
    Lsr = 0x16,
    Psh = 0x17,
    Pop = 0x18,
}

impl Opcode {
    /// Number of operand words consumed after the opcode word.
    pub fn arity(self) -> u8 {
        use Opcode::*;
        match self {
            Nop | Ret => 0,
            Ext | Sys | Jmp | Jsr | Not | Psh | Pop => 1,
            Mov | Add | Sub | Mul | Mdl | And | Orr | Xor | Lsl | Lsr => 2,
            Jeq | Jne | Jgt | Jge | Jlt | Jle => 3,
        }
    }
}

/// A single row of the assembler's mnemonic table: the source-level spelling,
/// the opcode it assembles to, and its arity (duplicated from
/// [`Opcode::arity`] only for fast table lookup, the way the original's
/// `Opcode` struct bundles `name`/`value`/`arity` together).
pub struct OpSpec {
    pub mnemonic: &'static str,
    pub opcode: Opcode,
    pub arity: u8,
}

/// The assembler-facing mnemonic table. The VM calls opcode `0x10` `Mdl`;
/// the assembler's external spelling for it is `mod` (settled open question,
/// see the VM spec's design notes). `mod` is a Rust keyword, which is exactly
/// why this table is a plain array keyed by string rather than a
/// derive-based `FromStr` on `Opcode` itself.
pub const OPCODES: &[OpSpec] = &[
    OpSpec { mnemonic: "nop", opcode: Opcode::Nop, arity: 0 },
    OpSpec { mnemonic: "ext", opcode: Opcode::Ext, arity: 1 },
    OpSpec { mnemonic: "sys", opcode: Opcode::Sys, arity: 1 },
    OpSpec { mnemonic: "mov", opcode: Opcode::Mov, arity: 2 },
    OpSpec { mnemonic: "jmp", opcode: Opcode::Jmp, arity: 1 },
    OpSpec { mnemonic: "jeq", opcode: Opcode::Jeq, arity: 3 },
    OpSpec { mnemonic: "jne", opcode: Opcode::Jne, arity: 3 },
    OpSpec { mnemonic: "jgt", opcode: Opcode::Jgt, arity: 3 },
    OpSpec { mnemonic: "jge", opcode: Opcode::Jge, arity: 3 },
    OpSpec { mnemonic: "jlt", opcode: Opcode::Jlt, arity: 3 },
    OpSpec { mnemonic: "jle", opcode: Opcode::Jle, arity: 3 },
    OpSpec { mnemonic: "jsr", opcode: Opcode::Jsr, arity: 1 },
    OpSpec { mnemonic: "ret", opcode: Opcode::Ret, arity: 0 },
    OpSpec { mnemonic: "add", opcode: Opcode::Add, arity: 2 },
    OpSpec { mnemonic: "sub", opcode: Opcode::Sub, arity: 2 },
    OpSpec { mnemonic: "mul", opcode: Opcode::Mul, arity: 2 },
    OpSpec { mnemonic: "mod", opcode: Opcode::Mdl, arity: 2 },
    OpSpec { mnemonic: "and", opcode: Opcode::And, arity: 2 },
    OpSpec { mnemonic: "orr", opcode: Opcode::Orr, arity: 2 },
    OpSpec { mnemonic: "not", opcode: Opcode::Not, arity: 1 },
    OpSpec { mnemonic: "xor", opcode: Opcode::Xor, arity: 2 },
    OpSpec { mnemonic: "lsl", opcode: Opcode::Lsl, arity: 2 },
    OpSpec { mnemonic: "lsr", opcode: Opcode::Lsr, arity: 2 },
    OpSpec { mnemonic: "psh", opcode: Opcode::Psh, arity: 1 },
    OpSpec { mnemonic: "pop", opcode: Opcode::Pop, arity: 1 },
];

/// Finds an opcode by its exact, case-sensitive, lowercase mnemonic.
pub fn find_opcode(mnemonic: &str) -> Option<&'static OpSpec> {
    OPCODES.iter().find(|spec| spec.mnemonic == mnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn opcode_table_has_25_entries() {
        assert_eq!(OPCODES.len(), 25);
    }

    #[test]
    fn mod_assembles_to_mdl() {
        let spec = find_opcode("mod").unwrap();
        assert_eq!(spec.opcode, Opcode::Mdl);
        assert_eq!(spec.opcode as u8, 0x10);
    }

    #[test]
    fn opcode_values_round_trip_through_from_primitive() {
        for spec in OPCODES {
            let byte = spec.opcode as u8;
            assert_eq!(Opcode::from_u8(byte), Some(spec.opcode));
        }
    }

    #[test]
    fn register_letters_are_case_sensitive() {
        assert_eq!("a".parse::<RegisterId>(), Ok(RegisterId::a));
        assert!("A".parse::<RegisterId>().is_err());
    }
}
