//! Driver debug output (`KHR_debug` / GL 4.3)
//!
//! The driver callback only queues messages. They are logged and filtered
//! when [`drain_debug_log`] runs on the thread that owns the context.

use crate::backend::GlBackend;
use crate::config::DebugConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Entries taken from the backend per drain step
const LOG_BATCH: u32 = 16;

/// Messages kept before the oldest are dropped
const QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugSource {
    Api,
    WindowSystem,
    ShaderCompiler,
    ThirdParty,
    Application,
    Other,
}

impl DebugSource {
    pub fn from_gl(value: u32) -> Self {
        match value {
            glow::DEBUG_SOURCE_API => DebugSource::Api,
            glow::DEBUG_SOURCE_WINDOW_SYSTEM => DebugSource::WindowSystem,
            glow::DEBUG_SOURCE_SHADER_COMPILER => DebugSource::ShaderCompiler,
            glow::DEBUG_SOURCE_THIRD_PARTY => DebugSource::ThirdParty,
            glow::DEBUG_SOURCE_APPLICATION => DebugSource::Application,
            _ => DebugSource::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugType {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Portability,
    Performance,
    Marker,
    PushGroup,
    PopGroup,
    Other,
}

impl DebugType {
    pub fn from_gl(value: u32) -> Self {
        match value {
            glow::DEBUG_TYPE_ERROR => DebugType::Error,
            glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => DebugType::DeprecatedBehavior,
            glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => DebugType::UndefinedBehavior,
            glow::DEBUG_TYPE_PORTABILITY => DebugType::Portability,
            glow::DEBUG_TYPE_PERFORMANCE => DebugType::Performance,
            glow::DEBUG_TYPE_MARKER => DebugType::Marker,
            glow::DEBUG_TYPE_PUSH_GROUP => DebugType::PushGroup,
            glow::DEBUG_TYPE_POP_GROUP => DebugType::PopGroup,
            _ => DebugType::Other,
        }
    }
}

/// Ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugSeverity {
    Notification,
    Low,
    Medium,
    High,
}

impl DebugSeverity {
    pub fn from_gl(value: u32) -> Self {
        match value {
            glow::DEBUG_SEVERITY_HIGH => DebugSeverity::High,
            glow::DEBUG_SEVERITY_MEDIUM => DebugSeverity::Medium,
            glow::DEBUG_SEVERITY_LOW => DebugSeverity::Low,
            _ => DebugSeverity::Notification,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugMessage {
    pub source: DebugSource,
    pub kind: DebugType,
    pub id: u32,
    pub severity: DebugSeverity,
    pub text: String,
}

impl DebugMessage {
    pub fn from_raw(source: u32, kind: u32, id: u32, severity: u32, text: String) -> Self {
        Self {
            source: DebugSource::from_gl(source),
            kind: DebugType::from_gl(kind),
            id,
            severity: DebugSeverity::from_gl(severity),
            text,
        }
    }
}

impl fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}/{:?}/{:?} #{}] {}",
            self.source, self.kind, self.severity, self.id, self.text
        )
    }
}

/// Shared queue filled by the driver debug callback.
///
/// Clones share the same storage. Once full, the oldest message is dropped.
#[derive(Debug, Clone, Default)]
pub struct DebugQueue {
    messages: Arc<Mutex<VecDeque<DebugMessage>>>,
}

impl DebugQueue {
    pub fn push(&self, message: DebugMessage) {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        if messages.len() == QUEUE_CAPACITY {
            messages.pop_front();
        }
        messages.push_back(message);
    }

    /// Remove up to `count` messages, oldest first
    pub fn drain(&self, count: usize) -> Vec<DebugMessage> {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        let take = count.min(messages.len());
        messages.drain(..take).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Apply `config` to the driver's debug output.
///
/// Returns whether debug output is on afterwards. Without debug support
/// nothing is changed and the result is false. With `config.enabled` unset,
/// `DEBUG_OUTPUT` and `DEBUG_OUTPUT_SYNCHRONOUS` are switched off and the
/// result is also false.
pub fn enable_debug_output<B: GlBackend>(backend: &B, config: &DebugConfig) -> bool {
    if !backend.supports_debug() {
        if config.enabled {
            tracing::warn!("debug output requested but the context has no debug support");
        }
        return false;
    }
    if !config.enabled {
        backend.set_capability(glow::DEBUG_OUTPUT_SYNCHRONOUS, false);
        backend.set_capability(glow::DEBUG_OUTPUT, false);
        tracing::debug!("disabled debug output");
        return false;
    }
    backend.set_capability(glow::DEBUG_OUTPUT, true);
    backend.set_capability(glow::DEBUG_OUTPUT_SYNCHRONOUS, config.synchronous);
    tracing::debug!(synchronous = config.synchronous, "enabled debug output");
    true
}

/// Take every pending debug message from the backend.
///
/// Every message is logged; those at or above `min_severity` are returned.
pub fn drain_debug_log<B: GlBackend>(
    backend: &B,
    min_severity: DebugSeverity,
) -> Vec<DebugMessage> {
    let mut kept = Vec::new();
    loop {
        let batch = backend.debug_message_log(LOG_BATCH);
        if batch.is_empty() {
            break;
        }
        for message in batch {
            if message.severity < min_severity {
                tracing::trace!("{}", message);
                continue;
            }
            match message.severity {
                DebugSeverity::High => tracing::error!("{}", message),
                DebugSeverity::Medium => tracing::warn!("{}", message),
                DebugSeverity::Low => tracing::info!("{}", message),
                DebugSeverity::Notification => tracing::debug!("{}", message),
            }
            kept.push(message);
        }
    }
    kept
}
