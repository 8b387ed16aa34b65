/// Sentinel value of [`Flags::exit`] meaning "the program has not yet
/// requested termination".
pub const NOT_EXITED: i32 = -1;

/// The three control fields that drive the VM's state machine.
///
/// # Examples
/// ```
/// use qcpu::Flags;
///
/// let flags = Flags::default();
/// assert_eq!(flags.exit, qcpu::flags::NOT_EXITED);
/// assert!(!flags.halt);
/// assert!(!flags.blok);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Flags {
    /// `true` while paused by a debugger/host; gates stepping.
    pub halt: bool,
    /// Sentinel `-1` means "not yet exited"; any other value is the
    /// program-requested termination code.
    pub exit: i32,
    /// `true` while yielding until the host releases the frame.
    pub blok: bool,
}

impl Default for Flags {
    fn default() -> Flags {
        Flags {
            halt: false,
            exit: NOT_EXITED,
            blok: false,
        }
    }
}

impl Flags {
    pub fn has_exited(&self) -> bool {
        self.exit != NOT_EXITED
    }
}
