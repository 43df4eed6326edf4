/// The tri-state value of a single filter position.
///
/// `Any` is a "don't care" position: the mask bit is clear, so the
/// corresponding value bit carries no information and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bit {
    One,
    Zero,
    Any,
}

impl Bit {
    /// `true` for `One`/`Zero`, `false` for `Any`.
    #[inline(always)] pub const fn is_exact(self) -> bool { !matches!(self, Bit::Any) }
}
