use thiserror::Error;

use crate::constants::{Address, STACK_SIZE};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    #[error("stack is full")]
    Overflow,

    #[error("stack is empty")]
    Underflow,
}

/// Call stack, holding return addresses
///
/// The stack pointer is the number of addresses currently on the stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stack {
    entries: [Address; STACK_SIZE],
    sp: usize,
}

impl Stack {
    /// Number of return addresses on the stack
    #[must_use]
    pub fn sp(&self) -> usize {
        self.sp
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.sp == STACK_SIZE
    }

    /// Return addresses, from the bottom of the stack to its top
    #[must_use]
    pub fn entries(&self) -> &[Address] {
        &self.entries[..self.sp]
    }

    /// Push a return address
    ///
    /// # Errors
    ///
    /// Fails without modifying the stack if it is already full
    pub fn push(&mut self, address: Address) -> Result<(), StackError> {
        let slot = self.entries.get_mut(self.sp).ok_or(StackError::Overflow)?;
        *slot = address;
        self.sp += 1;
        Ok(())
    }

    /// Pop the last return address
    ///
    /// # Errors
    ///
    /// Fails if the stack is empty
    pub fn pop(&mut self) -> Result<Address, StackError> {
        let sp = self.sp.checked_sub(1).ok_or(StackError::Underflow)?;
        self.sp = sp;
        Ok(self.entries[sp])
    }
}
