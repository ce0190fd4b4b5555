use std::path::Path;

use anyhow::Context;
use publish_core::frontmatter::parse_markdown_file;

use crate::output::print_json;

pub fn run(path: &Path, json: bool) -> anyhow::Result<()> {
    let article =
        parse_markdown_file(path).with_context(|| format!("failed to parse {}", path.display()))?;

    if json {
        return print_json(&article);
    }

    println!("title:   {}", article.title);
    println!("tags:    {}", article.tags.join(", "));
    println!("private: {}", article.private);
    if let Some(slug) = &article.slug {
        println!("slug:    {slug}");
    }
    if let Some(id) = &article.id {
        println!("id:      {id}");
    }
    println!("body:    {} chars", article.content.chars().count());
    Ok(())
}
