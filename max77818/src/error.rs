#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The register transport failed.
    Transport(E),
    /// A register did not read back the value that was written to it.
    VerificationMismatch { address: u8, expected: u16, actual: u16 },
    /// The model table did not read back as zero after locking.
    ModelLockFailed { address: u8 },
    /// The gauge firmware did not finish processing the model in time.
    ModelLoadTimeout,
    /// A setter value outside the register's encoding range.
    InvalidArgument,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::Transport(error)
    }
}
