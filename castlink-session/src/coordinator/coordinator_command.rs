/// Commands delivered to a running coordinator loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorCommand {
    /// Stop the session and release everything it holds.
    Shutdown,
}
