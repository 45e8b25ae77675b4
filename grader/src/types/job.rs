/// A leased queue message.
///
/// Only the queue adapter constructs jobs. Past the scheduler the receipt handle is
/// only ever handed back to [`crate::core::client::QueueClient::acknowledge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    message_id: String,
    receipt_handle: String,
    body: String,
    receive_count: u32,
}

impl Job {
    pub fn new(
        message_id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<String>,
        receive_count: u32,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            receipt_handle: receipt_handle.into(),
            body: body.into(),
            receive_count,
        }
    }

    /// Queue-assigned message id, stable across redeliveries of the same message
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Lease token for this delivery
    pub fn receipt_handle(&self) -> &str {
        &self.receipt_handle
    }

    pub fn body(&self) -> &[u8] {
        self.body.as_bytes()
    }

    pub fn raw_body(&self) -> &str {
        &self.body
    }

    /// How many times the queue has handed out this message, including this delivery
    pub fn receive_count(&self) -> u32 {
        self.receive_count
    }

    pub fn is_redelivery(&self) -> bool {
        self.receive_count > 1
    }
}
