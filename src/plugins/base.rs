use crate::core::geo::TileCoord;
use crate::prelude::{Arc, CancellationToken};
use crate::tiles::tile::Tile;
use crate::{MapError, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;

/// What a stage gets to work with: the tile being loaded and the token that
/// fires when the tile's pipeline is cancelled.
#[derive(Debug, Clone)]
pub struct PluginContext {
    tile: Arc<Tile>,
    cancel: CancellationToken,
}

impl PluginContext {
    pub fn new(tile: Arc<Tile>, cancel: CancellationToken) -> Self {
        Self { tile, cancel }
    }

    pub fn tile(&self) -> &Arc<Tile> {
        &self.tile
    }

    pub fn coord(&self) -> TileCoord {
        self.tile.coord()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fails with [`MapError::Cancelled`] once the pipeline was cancelled.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(MapError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A named unit of per-tile work.
///
/// `create` runs at most once per tile, after every stage named in
/// `dependencies` finished successfully. Results must be written to the tile
/// before `create` returns.
#[async_trait]
pub trait PluginTrait: Send + Sync {
    fn name(&self) -> &str;

    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Source layer this stage consumes, if any. Contributes to the layer
    /// set requested from the tile server.
    fn layer(&self) -> Option<&str> {
        None
    }

    async fn create(&self, ctx: &PluginContext) -> Result<()>;
}

/// Stage that does nothing. Useful as a join point for a group of stages.
pub struct BasePlugin {
    pub name: String,
    pub dependencies: Vec<String>,
}

impl BasePlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }
}

#[async_trait]
impl PluginTrait for BasePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    async fn create(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }
}

type StageFn = dyn Fn(PluginContext) -> BoxFuture<'static, Result<()>> + Send + Sync;

/// Stage backed by a closure.
///
/// ```ignore
/// let merge = FnPlugin::new("merge", ["roads", "buildings"], |ctx| {
///     Box::pin(async move {
///         let roads = ctx.tile().output("roads");
///         ctx.tile().set_output("merge", serde_json::json!(roads.is_some()))
///     })
/// });
/// ```
pub struct FnPlugin {
    name: String,
    dependencies: Vec<String>,
    run: Box<StageFn>,
}

impl FnPlugin {
    pub fn new<I, S, F>(name: impl Into<String>, dependencies: I, run: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(PluginContext) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            run: Box::new(run),
        }
    }
}

#[async_trait]
impl PluginTrait for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    async fn create(&self, ctx: &PluginContext) -> Result<()> {
        (self.run)(ctx.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::tile::TileState;

    #[tokio::test]
    async fn test_fn_plugin_runs_closure() {
        let tile = Arc::new(Tile::new(TileCoord::new(1, 2, 3)));
        tile.advance(TileState::Loading).unwrap();
        let ctx = PluginContext::new(tile.clone(), CancellationToken::new());

        let plugin = FnPlugin::new("mark", ["fetch"], |ctx: PluginContext| {
            Box::pin(async move { ctx.tile().set_output("mark", serde_json::json!(true)) })
                as BoxFuture<'static, Result<()>>
        });

        assert_eq!(plugin.name(), "mark");
        assert_eq!(plugin.dependencies(), vec!["fetch".to_string()]);
        plugin.create(&ctx).await.unwrap();
        assert_eq!(tile.output("mark").as_deref(), Some(&serde_json::json!(true)));
    }

    #[tokio::test]
    async fn test_base_plugin_is_noop() {
        let plugin = BasePlugin::new("join").depends_on("a").depends_on("b");
        let ctx = PluginContext::new(
            Arc::new(Tile::new(TileCoord::new(0, 0, 0))),
            CancellationToken::new(),
        );

        assert_eq!(plugin.dependencies(), vec!["a".to_string(), "b".to_string()]);
        assert!(plugin.layer().is_none());
        plugin.create(&ctx).await.unwrap();
    }

    #[test]
    fn test_context_reports_cancellation() {
        let cancel = CancellationToken::new();
        let ctx = PluginContext::new(Arc::new(Tile::new(TileCoord::new(0, 0, 0))), cancel.clone());
        assert!(ctx.check_cancelled().is_ok());
        cancel.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(MapError::Cancelled)));
    }
}
