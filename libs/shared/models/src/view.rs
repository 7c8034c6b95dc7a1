use async_trait::async_trait;

use crate::error::ClientError;

/// User-visible feedback of a dashboard: one error slot, one success slot
/// and the in-flight flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notices {
    pub error: Option<String>,
    pub success: Option<String>,
    pub loading: bool,
}

impl Notices {
    /// Clear feedback and raise the loading flag at the start of a handler.
    pub fn begin(&mut self) {
        self.error = None;
        self.success = None;
        self.loading = true;
    }

    pub fn finish(&mut self) {
        self.loading = false;
    }

    pub fn fail(&mut self, err: &ClientError) {
        self.error = Some(err.to_string());
        self.loading = false;
    }

    pub fn fail_with(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.loading = false;
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.success = Some(message.into());
        self.error = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A dashboard whose dataset is refetched in full after any mutation.
#[async_trait]
pub trait ReloadableView: Send {
    async fn reload(&mut self);

    fn notices(&mut self) -> &mut Notices;
}
