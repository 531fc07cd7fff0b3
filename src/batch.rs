//! Rendering many recipients against one template.
//!
//! With the `parallel` feature (on by default) items are spread over rayon's
//! global work-stealing pool; otherwise they render one after another. Either
//! way each item resolves its own fonts and owns its own output buffer, and
//! results come back in input order.

use hamcert_render::{Compositor, RenderError, RenderRequest};
use hamcert_types::{FieldValues, TemplateDescriptor};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Renders every entry of `requests` with `descriptor`.
///
/// A failing item does not stop the others.
pub fn render_batch(
    compositor: &Compositor,
    descriptor: &TemplateDescriptor,
    requests: &[FieldValues],
) -> Vec<Result<Vec<u8>, RenderError>> {
    log::debug!(
        "Rendering batch of {} against template '{}'",
        requests.len(),
        descriptor.name
    );

    let render_one = |values: &FieldValues| {
        compositor
            .compose(RenderRequest::new(descriptor, values))
            .map(|document| document.into_bytes())
    };

    #[cfg(feature = "parallel")]
    let results: Vec<_> = requests.par_iter().map(render_one).collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = requests.iter().map(render_one).collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        log::warn!("{} of {} certificates failed to render", failed, results.len());
    }
    results
}
