use atom_syndication::{
    Entry, EntryBuilder, Feed, FeedBuilder, FixedDateTime, LinkBuilder, PersonBuilder, Text,
};

use crate::{
    article::Article,
    config::SiteConfig,
    transform::{create_clean_description, DescriptionOptions},
};

fn published(article: &Article) -> Option<FixedDateTime> {
    article
        .published_on()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc().fixed_offset())
}

fn entry(article: &Article, site: &SiteConfig, fallback: FixedDateTime) -> Entry {
    let url = format!("{}/thoughts/{}", site.domain(), article.slug);
    let published = published(article);
    let summary = create_clean_description(
        &article.content,
        site.author(),
        DescriptionOptions::new(site.description_max_length),
    );

    EntryBuilder::default()
        .title(Text::plain(article.title.clone()))
        .id(url.clone())
        .updated(published.unwrap_or(fallback))
        .published(published)
        .links(vec![LinkBuilder::default().href(url).rel("alternate").build()])
        .summary(Some(Text::plain(summary)))
        .build()
}

/// Atom feed of every article, in the order given.
pub(super) fn build_feed(articles: &[Article], site: &SiteConfig, now: FixedDateTime) -> Feed {
    let domain = site.domain();
    let entries: Vec<Entry> = articles.iter().map(|a| entry(a, site, now)).collect();
    let updated = entries.iter().map(|e| e.updated).max().unwrap_or(now);
    let mut feed = FeedBuilder::default();
    feed.title(Text::plain(format!("Thoughts - {}", site.name)))
        .id(format!("{domain}/thoughts"))
        .updated(updated)
        .authors(vec![PersonBuilder::default().name(site.author()).build()])
        .links(vec![
            LinkBuilder::default()
                .href(format!("{domain}/thoughts"))
                .rel("alternate")
                .build(),
            LinkBuilder::default()
                .href(format!("{domain}/thoughts/feed.xml"))
                .rel("self")
                .build(),
        ])
        .entries(entries);
    if !site.thoughts_description.is_empty() {
        feed.subtitle(Some(Text::plain(site.thoughts_description.clone())));
    }
    feed.build()
}
