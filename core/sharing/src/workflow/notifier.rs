use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::{channel, Sender};

#[derive(Error, Debug)]
pub enum NotifierError<Type: Debug> {
    #[error("Timeout while waiting for events for [{0:?}]")]
    Timeout(Type),
    #[error("Stopped notifying about [{0:?}]")]
    Stopped(Type),
    #[error("Channel closed while waiting for events for [{0:?}]")]
    ChannelClosed(Type),
}

/// In-process wake-up channel for observers of one workflow subject.
/// Best-effort only; a woken observer re-reads authoritative state from the
/// database.
#[derive(Clone)]
pub struct EventNotifier<Type>
where
    Type: Clone + PartialEq + Debug + Send,
{
    sender: Sender<Notification<Type>>,
}

#[derive(Clone)]
enum Notification<Type> {
    NewEvent(Type),
    StopEvents(Type),
}

impl<Type> EventNotifier<Type>
where
    Type: Clone + PartialEq + Debug + Send + 'static,
{
    pub fn new() -> EventNotifier<Type> {
        // Receivers are created on demand by listeners.
        let (sender, _receiver) = channel(100);
        EventNotifier { sender }
    }

    pub async fn notify(&self, subject: &Type) {
        let to_send = Notification::NewEvent(subject.clone());
        let _ = self.sender.send(to_send);
    }

    pub async fn stop_notifying(&self, subject: &Type) {
        let to_send = Notification::StopEvents(subject.clone());
        let _ = self.sender.send(to_send);
    }

    pub async fn wait_for_event(&self, subject: &Type) -> Result<(), NotifierError<Type>> {
        let mut receiver = self.sender.subscribe();
        while let Ok(value) = receiver.recv().await {
            match value {
                Notification::NewEvent(value) => {
                    if &value == subject {
                        return Ok(());
                    }
                }
                Notification::StopEvents(value) => {
                    if &value == subject {
                        return Err(NotifierError::Stopped(value));
                    }
                }
            }
        }
        Err(NotifierError::ChannelClosed(subject.clone()))
    }

    pub async fn wait_for_event_with_timeout(
        &self,
        subject: &Type,
        timeout: Duration,
    ) -> Result<(), NotifierError<Type>> {
        let notifier = self.clone();
        match tokio::time::timeout(timeout, notifier.wait_for_event(subject)).await {
            Err(_) => Err(NotifierError::Timeout(subject.clone())),
            Ok(wait_result) => wait_result,
        }
    }
}

impl<Type> Default for EventNotifier<Type>
where
    Type: Clone + PartialEq + Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
