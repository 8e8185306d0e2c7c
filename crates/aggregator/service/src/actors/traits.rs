use async_trait::async_trait;

/// An actor-like task of the aggregator service.
#[async_trait]
pub trait AggregatorActor {
    /// The error type for the actor.
    type Error: std::fmt::Debug;
    /// Runs the actor until it is cancelled or fails.
    async fn start(mut self) -> Result<(), Self::Error>;
}
