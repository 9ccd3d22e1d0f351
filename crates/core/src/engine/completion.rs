use std::sync::mpsc;

use thiserror::Error;

use super::attempt::AttemptResult;

/// The receiving side of a completion sink has gone away.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("completion receiver is unavailable")]
pub struct DeliveryError;

/// Where a finished attempt's score goes.
///
/// Delivery must either hand the result over or report failure; the engine
/// only marks an attempt finished after a successful delivery.
pub trait CompletionSink: Send {
    /// # Errors
    ///
    /// Returns `DeliveryError` when the result could not be handed over.
    fn deliver(&mut self, result: &AttemptResult) -> Result<(), DeliveryError>;
}

impl<F> CompletionSink for F
where
    F: FnMut(&AttemptResult) -> Result<(), DeliveryError> + Send,
{
    fn deliver(&mut self, result: &AttemptResult) -> Result<(), DeliveryError> {
        self(result)
    }
}

/// Sink that forwards results over a std channel.
#[derive(Debug)]
pub struct ChannelSink(mpsc::Sender<AttemptResult>);

impl ChannelSink {
    /// Create a sink and the receiver that will observe delivered results.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<AttemptResult>) {
        let (tx, rx) = mpsc::channel();
        (Self(tx), rx)
    }
}

impl CompletionSink for ChannelSink {
    fn deliver(&mut self, result: &AttemptResult) -> Result<(), DeliveryError> {
        self.0.send(result.clone()).map_err(|_| DeliveryError)
    }
}
