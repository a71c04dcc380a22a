//! Markdown code block rendering.
//!
//! A note embeds ```` ```LifeOS ```` blocks whose body names a view. The host
//! hands each block to [`BlockRenderer::render`], which looks the view up and
//! writes its output, or an inline error, into the render target.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::{SyncError, SyncResult};
use crate::i18n::{self, Locale, Message};

pub const BLOCK_TYPE: &str = "LifeOS";
/// Older notes still use the previous plugin name.
pub const LEGACY_BLOCK_TYPE: &str = "PeriodicPARA";

#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub block_type: &'a str,
    pub source: &'a str,
    pub source_path: &'a str,
}

/// Where rendered output goes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    Rendered,
    /// The error was written inline into the target.
    Error(String),
}

pub trait View: Send + Sync {
    fn render(&self, view: &str, source_path: &str, target: &mut RenderTarget) -> SyncResult<()>;
}

pub struct BlockRenderer {
    views: HashMap<String, Arc<dyn View>>,
    locale: Locale,
}

impl BlockRenderer {
    pub fn new(locale: Locale) -> Self {
        Self {
            views: HashMap::new(),
            locale,
        }
    }

    pub fn register(&mut self, name: impl Into<String>, view: Arc<dyn View>) {
        self.views.insert(name.into(), view);
    }

    pub fn handles(&self, block_type: &str) -> bool {
        block_type == BLOCK_TYPE || block_type == LEGACY_BLOCK_TYPE
    }

    fn lookup(&self, view: &str) -> Option<&Arc<dyn View>> {
        self.views
            .get(view)
            .or_else(|| self.views.get(&format!("{view}ByTime")))
    }

    fn resolve(&self, request: &RenderRequest<'_>) -> SyncResult<(String, Arc<dyn View>)> {
        if !self.handles(request.block_type) {
            return Err(SyncError::UnknownView(request.block_type.to_string()));
        }
        let view = request.source.trim();
        if view.is_empty() {
            return Err(SyncError::NoViewProvided);
        }
        let handler = self
            .lookup(view)
            .cloned()
            .ok_or_else(|| SyncError::UnknownView(view.to_string()))?;
        Ok((view.to_string(), handler))
    }

    /// Renders a block. Failures never propagate: they are written into
    /// `target` as an error callout.
    pub fn render(&self, request: RenderRequest<'_>, target: &mut RenderTarget) -> RenderResult {
        let outcome = self
            .resolve(&request)
            .and_then(|(view, handler)| handler.render(&view, request.source_path, target));
        match outcome {
            Ok(()) => RenderResult::Rendered,
            Err(err) => {
                let message = self.error_message(&err);
                warn!(source_path = request.source_path, "render failed: {err}");
                target.markdown = format!("> [!error]\n> {message}\n");
                RenderResult::Error(message)
            }
        }
    }

    fn error_message(&self, err: &SyncError) -> String {
        match err {
            SyncError::NoViewProvided => i18n::text(self.locale, Message::NoViewProvided).to_string(),
            SyncError::UnknownView(view) => {
                format!("{}: {view}", i18n::text(self.locale, Message::NoViewExisted))
            }
            other => other.to_string(),
        }
    }
}
