//! Image reference resolution.

/// Trait for image resolvers.
///
/// Resolvers map an image reference from the input to the identifier the
/// output embeds, typically a local file name. Fetching and caching are the
/// resolver's business; the renderer only asks.
pub trait ImageResolver {
    /// Identifier for `reference`, or `None` when it cannot be resolved.
    fn resolve(&self, reference: &str) -> Option<String>;
}

/// Resolver that embeds references unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughImages;

impl ImageResolver for PassthroughImages {
    fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        (!reference.is_empty()).then(|| reference.to_string())
    }
}

impl<F> ImageResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, reference: &str) -> Option<String> {
        self(reference)
    }
}
