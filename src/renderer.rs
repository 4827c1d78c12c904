use std::path::Path;

use anyhow::Context;
use handlebars::{handlebars_helper, Handlebars};

use crate::article::parse_date;

// 2024-01-01 -> January 1, 2024
handlebars_helper!(format_date: |date: str| {
    parse_date(date)
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| date.to_string())
});

pub(crate) const TEMPLATES: [&str; 4] = ["home", "thoughts", "article", "not_found"];

pub(crate) fn generate_renderer(template_dir: &Path) -> anyhow::Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars.register_helper("format_date", Box::new(format_date));
    for name in TEMPLATES {
        let file_name = format!("{name}.hbs");
        handlebars
            .register_template_file(name, template_dir.join(&file_name))
            .context(file_name)?;
    }
    handlebars.register_partial(
        "layout",
        std::fs::read_to_string(template_dir.join("layout.hbs")).context("layout.hbs")?,
    )?;

    Ok(handlebars)
}
