///
/// Page
///
/// Result window. A limit of 0 means unbounded; offsets are plain skips.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        self.limit == 0
    }
}
