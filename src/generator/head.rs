use maud::{html, PreEscaped};
use serde_json::Value;

use crate::{
    config::SiteConfig,
    metadata::{PageMetadata, PageType},
};

const OG_IMAGE_WIDTH: u32 = 1200;
const OG_IMAGE_HEIGHT: u32 = 630;

fn image_mime(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "image/jpeg",
    }
}

/// Everything the page needs in `<head>` for search engines and link
/// previews.
pub(super) fn render_head(
    page: &PageMetadata,
    site: &SiteConfig,
    structured_data: &Value,
) -> String {
    // a literal `</script>` inside the JSON would end the element early
    let json_ld = structured_data.to_string().replace("</", "<\\/");
    let keywords = site.keywords.join(", ");

    html! {
        title { (page.title) }
        meta name="title" content=(page.title);
        meta name="description" content=(page.description);
        meta name="author" content=(page.author);
        @if !keywords.is_empty() {
            meta name="keywords" content=(keywords);
        }
        meta name="robots" content="index, follow";

        meta property="og:site_name" content=(site.name);
        meta property="og:type" content=(page.page_type.as_str());
        meta property="og:url" content=(page.url);
        meta property="og:title" content=(page.title);
        meta property="og:description" content=(page.description);
        meta property="og:image" content=(page.image);
        meta property="og:image:secure_url" content=(page.image);
        meta property="og:image:width" content=(OG_IMAGE_WIDTH);
        meta property="og:image:height" content=(OG_IMAGE_HEIGHT);
        meta property="og:image:alt" content=(page.title);
        meta property="og:image:type" content=(image_mime(&page.image));
        meta property="og:locale" content=(site.locale);

        meta property="twitter:card" content="summary_large_image";
        @if let Some(handle) = &site.twitter {
            meta property="twitter:site" content=(handle);
            meta property="twitter:creator" content=(handle);
        }
        meta property="twitter:url" content=(page.url);
        meta property="twitter:title" content=(page.title);
        meta property="twitter:description" content=(page.description);
        meta property="twitter:image" content=(page.image);
        meta property="twitter:image:alt" content=(page.title);

        @if page.page_type == PageType::Article {
            @if let Some(published) = &page.published_time {
                meta property="article:published_time" content=(published);
            }
            meta property="article:author" content=(page.author);
        }

        link rel="canonical" href=(page.url);
        script type="application/ld+json" { (PreEscaped(json_ld)) }

        meta name="theme-color" content=(site.theme_color);
        meta name="color-scheme" content="light";
    }
    .into_string()
}
