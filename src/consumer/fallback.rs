//! Provider operations and their degraded answers.

use crate::resilience::error::CallError;
use crate::resilience::fallback::FallbackHandler;

/// The calls the consumer makes on the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOperation {
    SayHi,
    SayHiWithFail,
    SayHiWithSleep,
}

impl ProviderOperation {
    pub const ALL: [ProviderOperation; 3] = [
        ProviderOperation::SayHi,
        ProviderOperation::SayHiWithFail,
        ProviderOperation::SayHiWithSleep,
    ];

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Provider path, relative to the instance root.
    pub fn path(&self) -> &'static str {
        match self {
            ProviderOperation::SayHi => "",
            ProviderOperation::SayHiWithFail => "fail",
            ProviderOperation::SayHiWithSleep => "sleep",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderOperation::SayHi => "sayHi",
            ProviderOperation::SayHiWithFail => "sayHiWithFail",
            ProviderOperation::SayHiWithSleep => "sayHiWithSleep",
        }
    }

    pub fn fallback_message(&self) -> String {
        format!("hi, this is from open feign customer call back, {}", self.as_str())
    }
}

/// Answers a failed provider call with the operation's fixed message.
#[derive(Debug, Clone, Copy)]
pub struct ProviderFallback {
    operation: ProviderOperation,
}

impl ProviderFallback {
    pub fn new(operation: ProviderOperation) -> Self {
        Self { operation }
    }
}

impl FallbackHandler for ProviderFallback {
    fn on_rejected_or_failed(&self, cause: &CallError) -> String {
        tracing::warn!(operation = self.operation.as_str(), error = %cause, "Provider call fell back");
        self.operation.fallback_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_messages() {
        let fallback = ProviderFallback::new(ProviderOperation::SayHiWithFail);
        assert_eq!(
            fallback.on_rejected_or_failed(&CallError::RemoteFailure("500".into())),
            "hi, this is from open feign customer call back, sayHiWithFail"
        );
        for (i, operation) in ProviderOperation::ALL.iter().enumerate() {
            assert_eq!(operation.index(), i);
        }
        assert_eq!(
            ProviderOperation::SayHi.fallback_message(),
            "hi, this is from open feign customer call back, sayHi"
        );
    }
}
