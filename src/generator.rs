use std::{
    fs::OpenOptions,
    io::{BufWriter, Write as _},
    path::Path,
};

use anyhow::Context as _;
use chrono::Utc;
use fs_extra::dir::CopyOptions;
use log::{info, warn};

use crate::{
    article::Article,
    cache::resolve_links,
    context::Context,
    images::ImageRegistry,
    loader::{load_article, load_articles, ContentSource},
    metadata::{compose_article, compose_site_page, structured_data, SitePage},
    transform::{collect_links, create_markdown_excerpt},
};

use self::{
    data::{ArticlePageData, ListPageData, PostSummary, Reference, SitePageData},
    feed::build_feed,
    head::render_head,
    utils::{render_markdown, render_preview},
};

mod data;
mod feed;
mod head;
mod utils;

/// Posts shown on the home page.
const LATEST_POSTS: usize = 3;

/// Result of rendering a directly requested article.
#[derive(Debug)]
pub(crate) enum RenderedPage {
    Article(String),
    NotFound(String),
}

fn site_head(ctx: &Context, page: SitePage) -> String {
    let meta = compose_site_page(page, &ctx.site);
    render_head(&meta, &ctx.site, &structured_data(&meta, &ctx.site, Some(page)))
}

fn summarize<'a>(ctx: &Context, article: &'a Article) -> PostSummary<'a> {
    let excerpt = create_markdown_excerpt(&article.content, ctx.site.excerpt_max_length);
    PostSummary {
        slug: &article.slug,
        title: &article.title,
        date: &article.date,
        excerpt: render_preview(&excerpt),
    }
}

fn references(ctx: &Context, article: &Article) -> Vec<Reference> {
    let urls = collect_links(&article.content);
    if urls.is_empty() {
        return vec![];
    }
    let mut resolved = {
        let mut cache = ctx.link_cache();
        resolve_links(&urls, &mut cache, ctx.fetcher.as_ref(), Utc::now())
    };
    urls.into_iter()
        .map(|url| Reference {
            meta: resolved.remove(&url),
            url,
        })
        .collect()
}

fn render_article(
    ctx: &Context,
    article: &Article,
    registry: &ImageRegistry,
) -> anyhow::Result<String> {
    let meta = compose_article(article, &ctx.site, registry);
    let data = ArticlePageData {
        site: &ctx.site,
        head: render_head(&meta, &ctx.site, &structured_data(&meta, &ctx.site, None)),
        article,
        body: render_markdown(&article.content),
        references: references(ctx, article),
    };
    ctx.handlebars
        .render("article", &data)
        .with_context(|| format!("while rendering article {:?}", article.slug))
}

fn render_not_found(ctx: &Context) -> anyhow::Result<String> {
    let data = SitePageData {
        site: &ctx.site,
        head: site_head(ctx, SitePage::NotFound),
    };
    ctx.handlebars
        .render("not_found", &data)
        .context("while rendering the not found page")
}

fn render_list(
    ctx: &Context,
    template: &str,
    page: SitePage,
    articles: &[Article],
) -> anyhow::Result<String> {
    let data = ListPageData {
        site: &ctx.site,
        head: site_head(ctx, page),
        posts: articles.iter().map(|a| summarize(ctx, a)).collect(),
    };
    ctx.handlebars
        .render(template, &data)
        .with_context(|| format!("while rendering {template}"))
}

fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs_extra::dir::create_all(parent, false)?;
    }
    let fd = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("while opening {path:?}"))?;
    let mut writer = BufWriter::new(fd);
    writer
        .write_all(content.as_bytes())
        .with_context(|| format!("while writing {path:?}"))?;
    writer.flush()?;
    Ok(())
}

/// Renders the page for `slug`, or the not found page if there is none.
pub(crate) fn render_article_page(
    ctx: &Context,
    source: &dyn ContentSource,
    registry: &ImageRegistry,
    slug: &str,
) -> anyhow::Result<RenderedPage> {
    match load_article(source, slug, registry) {
        Ok(article) => Ok(RenderedPage::Article(render_article(ctx, &article, registry)?)),
        Err(e) if e.is_not_found() => {
            warn!("Article {slug:?} not found");
            Ok(RenderedPage::NotFound(render_not_found(ctx)?))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn generate(
    ctx: &Context,
    source: &dyn ContentSource,
    registry: &ImageRegistry,
) -> anyhow::Result<()> {
    fs_extra::dir::remove(&ctx.out_dir)?;
    fs_extra::dir::create_all(&ctx.out_dir, false)?;

    // copy `public_dir` and article images
    let mut cp_opts = CopyOptions::new();
    cp_opts.copy_inside = true;
    cp_opts.content_only = true;
    cp_opts.overwrite = true;
    if ctx.public_dir.is_dir() {
        fs_extra::dir::copy(&ctx.public_dir, &ctx.out_dir, &cp_opts)
            .with_context(|| format!("while copying {:?}", ctx.public_dir))?;
    } else {
        info!("Public directory({:?}) does not exist. ignoring...", ctx.public_dir);
    }
    if ctx.images_dir.is_dir() {
        let images_out = ctx
            .out_dir
            .join(ctx.site.image_url_prefix.trim_start_matches('/'));
        fs_extra::dir::create_all(&images_out, false)?;
        fs_extra::dir::copy(&ctx.images_dir, &images_out, &cp_opts)
            .with_context(|| format!("while copying {:?}", ctx.images_dir))?;
    }

    let articles = load_articles(source, registry)?;
    info!("Loaded {} articles", articles.len());

    // generate article pages
    for article in articles.iter() {
        let html = render_article(ctx, article, registry)?;
        write_output(
            &ctx.out_dir.join("thoughts").join(&article.slug).join("index.html"),
            &html,
        )?;
    }

    // generate index pages
    let latest = &articles[..articles.len().min(LATEST_POSTS)];
    write_output(
        &ctx.out_dir.join("index.html"),
        &render_list(ctx, "home", SitePage::Home, latest)?,
    )?;
    write_output(
        &ctx.out_dir.join("thoughts").join("index.html"),
        &render_list(ctx, "thoughts", SitePage::Thoughts, &articles)?,
    )?;
    write_output(&ctx.out_dir.join("404.html"), &render_not_found(ctx)?)?;

    let feed = build_feed(&articles, &ctx.site, Utc::now().fixed_offset());
    write_output(&ctx.out_dir.join("thoughts").join("feed.xml"), &feed.to_string())?;

    Ok(())
}
