//! Listing repository contents.

use anyhow::Result;

use crate::context::RepoContext;
use crate::index::load_index;
use crate::ini::IniDocument;

fn format_listing(doc: &IniDocument) -> String {
    doc.sections()
        .map(|(name, section)| {
            let field = |k: &str| section.get(k).map(|v| v.as_str()).unwrap_or("-");
            format!(
                "{name:<32} {:<8} {:<6} {}\n",
                field("arch"),
                field("format"),
                field("size")
            )
        })
        .collect()
}

/// Print the images in the repository index.
pub fn list(ctx: &RepoContext<'_>) -> Result<()> {
    let doc = load_index(&ctx.repo)?;
    if doc.is_empty() {
        tracing::info!("Repository {} has no images", ctx.repo.name);
    }
    print!("{}", format_listing(&doc));
    Ok(())
}
