use shimmer_core_types::NodeId;

/// Closed set of notifications emitted by the page-update engine.
///
/// One variant per fixed point in a request's life plus the two
/// history-cache hooks. `SkeletonController::handle_event` matches
/// exhaustively, so a new variant cannot be silently ignored.
#[derive(Clone, Debug)]
pub enum LifecycleEvent {
    /// A request is about to be issued by `control`.
    RequestStarted { control: NodeId },
    /// Response content is about to replace the current content of `target`.
    BeforeSwap { target: NodeId },
    /// New content has been committed into `target`.
    AfterSwap { target: NodeId },
    /// The request issued by `control` completed with an error response.
    ResponseError { control: NodeId },
    /// The request issued by `control` could not be sent at all.
    SendError { control: NodeId },
    /// The engine is about to serialize the page for the history cache.
    BeforeHistorySnapshot,
    /// A cached page snapshot has been reactivated by history navigation.
    HistoryRestored,
}
