extern crate num;
#[macro_use]
extern crate num_derive;

pub mod constants;
pub mod flags;
pub mod isa;
pub mod memory;
pub mod registers;
pub mod stack;
pub mod vm;

pub use flags::Flags;
pub use isa::{AddressingMode, Opcode, OpSpec, RegisterId, OPCODES};
pub use memory::{LoadError, Memory};
pub use registers::Registers;
pub use stack::Stack;
pub use vm::{Arg, RunState, Syscall, Vm, VmState};
