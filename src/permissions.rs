/// The permission a caller requests when pinning a page. `ReadWrite`
/// requires an exclusive lock; `ReadOnly` is satisfied by a shared lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}
