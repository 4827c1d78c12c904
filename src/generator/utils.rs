use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn escape(s: &str) -> String {
    maud::html! { (s) }.into_string()
}

fn open_external_link(url: &CowStr, title: &CowStr) -> String {
    let title = if title.is_empty() {
        String::new()
    } else {
        format!(" title=\"{}\"", escape(title))
    };
    format!(
        "<a href=\"{}\"{title} target=\"_blank\" rel=\"noopener noreferrer\">",
        escape(url)
    )
}

/// Event filter shared by full articles and previews.
///
/// Previews drop images and render headings as bold text.
pub(super) fn gen_parser_event_iterator<'a>(
    preview: bool,
) -> Box<dyn FnMut(Event<'a>) -> Option<Event<'a>> + 'a> {
    let mut external_link = false;
    let mut image_depth = 0usize;

    Box::new(move |event: Event<'a>| -> Option<Event<'a>> {
        if image_depth > 0 {
            match event {
                Event::Start(Tag::Image { .. }) => image_depth += 1,
                Event::End(TagEnd::Image) => image_depth -= 1,
                _ => {}
            }
            return None;
        }

        match event {
            Event::Start(Tag::Link {
                ref dest_url,
                ref title,
                ..
            }) if is_external(dest_url) => {
                external_link = true;
                Some(Event::InlineHtml(open_external_link(dest_url, title).into()))
            }
            Event::End(TagEnd::Link) if external_link => {
                external_link = false;
                Some(Event::InlineHtml("</a>".into()))
            }
            Event::Start(Tag::Image { .. }) if preview => {
                image_depth = 1;
                None
            }
            Event::Start(Tag::Heading { .. }) if preview => Some(Event::Html("<p><strong>".into())),
            Event::End(TagEnd::Heading(_)) if preview => Some(Event::Html("</strong></p>".into())),
            _ => Some(event),
        }
    })
}

pub(super) fn render_markdown(content: &str) -> String {
    let parser =
        Parser::new_ext(content, markdown_options()).filter_map(gen_parser_event_iterator(false));
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

pub(super) fn render_preview(excerpt: &str) -> String {
    let parser =
        Parser::new_ext(excerpt, markdown_options()).filter_map(gen_parser_event_iterator(true));
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}
