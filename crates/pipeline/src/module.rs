use crate::pipeline::PipelineBuilder;

/// An optional feature that plugs itself into a [`PipelineBuilder`].
///
/// A module registers routes, decorators or both; configuration happens before
/// registration, on the module value itself.
pub trait Module {
    /// Short name used in the registration log.
    fn name(&self) -> &'static str;

    /// Adds this module's routes and decorators to `builder` and hands it back.
    fn register(&self, builder: PipelineBuilder) -> PipelineBuilder;
}
